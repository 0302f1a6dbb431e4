//! Page session example - attach a tracker and drive an in-process page
//!
//! Point COLLECTOR_URL at something that accepts POSTs to watch the beacons
//! arrive; the default endpoint just swallows them.

use serde_json::json;
use tracker::{Element, Options, Page, Tracker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let collector = std::env::var("COLLECTOR_URL")
        .unwrap_or_else(|_| "http://localhost:8080/track".to_string());
    println!("Reporting to: {}", collector);

    let page = Page::new("https://shop.example/")?;
    let mut tracker = Tracker::new(Options::new(collector).with_field("appId", "demo"), page)?;
    tracker.set_user_id("user-1");

    let page = tracker.page().clone();

    // Navigation
    page.history()
        .push_state(json!({"product": 7}), "", Some("/product/7"))?;
    page.history().set_hash("#reviews");
    page.history().back();

    // Interactions: only the marked button is reported
    page.click(Element::new("button").with_attribute("target-key", "add-to-cart"));
    page.click(Element::new("div"));

    // Failures
    page.raise_error("Cannot read properties of undefined");
    page.reject("checkout timed out");

    // Custom event
    tracker.set_extra(json!({"cart": 1}));
    tracker.send_tracker(&json!({"event": "checkout", "targetKey": "cart"}));

    // Give the detached beacons a moment before the runtime shuts down
    tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;

    tracker.dispose()?;
    println!("Done");

    Ok(())
}
