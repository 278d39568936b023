//! HTML for the list page.

use crate::models::todo::TodoItem;

pub fn render_index(items: &[TodoItem]) -> String {
    let mut html = String::from(concat!(
        "<!DOCTYPE html>",
        "<html><head><meta charset=\"utf-8\"><title>To-do list</title></head><body>",
        "<h1>To-do list</h1>",
        "<form method=\"post\" action=\"/create\">",
        "<input type=\"text\" name=\"text\" maxlength=\"100\" required>",
        "<button type=\"submit\">Add</button>",
        "</form>",
    ));

    if items.is_empty() {
        html.push_str("<p class=\"empty\">Nothing to do.</p>");
    } else {
        html.push_str("<ul>");
        for item in items {
            html.push_str(&render_item(item));
        }
        html.push_str("</ul>");
    }

    html.push_str("</body></html>");
    html
}

fn render_item(item: &TodoItem) -> String {
    let text = html_escape(&item.text);
    let class = if item.completed { "done" } else { "open" };
    let checked = if item.completed { " checked" } else { "" };

    let mut li = format!("<li class=\"{}\">", class);
    li.push_str("<form method=\"post\" action=\"/update\">");
    li.push_str(&format!("<input type=\"hidden\" name=\"id\" value=\"{}\">", item.id));
    li.push_str(&format!(
        "<input type=\"checkbox\" name=\"completed\"{}>",
        checked
    ));
    li.push_str(&format!(
        "<input type=\"text\" name=\"text\" value=\"{}\" maxlength=\"100\">",
        text
    ));
    li.push_str("<button type=\"submit\">Save</button></form>");
    li.push_str("<form method=\"post\" action=\"/delete\">");
    li.push_str(&format!("<input type=\"hidden\" name=\"id\" value=\"{}\">", item.id));
    li.push_str("<button type=\"submit\">Delete</button></form>");
    li.push_str(&format!(
        "<span class=\"created\">{}</span>",
        item.created_on.format("%Y-%m-%d %H:%M")
    ));
    li.push_str("</li>");
    li
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
