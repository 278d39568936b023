use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use serverless_kit::{
    config::{process_env, say_hi_message},
    models::email::SendReceipt,
    services::mailer::{Mailer, SesMailer},
    telemetry,
};

async fn handle_request(
    _event: LambdaEvent<Value>,
    mailer: &SesMailer,
) -> Result<SendReceipt, Error> {
    let message = say_hi_message(&process_env)?;
    Ok(mailer.send(&message).await?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init_function_tracing("info");

    let mailer = SesMailer::from_env().await;
    let mailer = &mailer;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, mailer).await
    }))
    .await
}
