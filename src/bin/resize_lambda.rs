use lambda_runtime::{Error, LambdaEvent, service_fn};
use serverless_kit::{
    config::{ResizeConfig, process_env},
    models::event::S3Event,
    services::{
        object_store::S3ObjectStore,
        thumbnail::{ResizeSummary, ThumbnailHandler},
    },
    telemetry,
};

async fn handle_request(
    event: LambdaEvent<S3Event>,
    handler: &ThumbnailHandler<S3ObjectStore>,
) -> Result<ResizeSummary, Error> {
    let outcomes = handler.handle_event(&event.payload).await?;
    Ok(ResizeSummary::from(outcomes.as_slice()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init_function_tracing("info");

    let config = ResizeConfig::from_env(&process_env)?;
    let handler = ThumbnailHandler::new(S3ObjectStore::from_env().await, config);
    let handler = &handler;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<S3Event>| async move {
        handle_request(event, handler).await
    }))
    .await
}
