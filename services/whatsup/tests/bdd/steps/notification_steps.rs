//! BDD step definitions for notification channels

use cucumber::{given, then};

use whatsup::config::NotificationChannel;

use crate::world::WhatsupWorld;

fn channel(kind: &str, webhook: Option<String>) -> NotificationChannel {
    NotificationChannel {
        kind: kind.to_string(),
        message_down: "Site down".to_string(),
        message_up: "Site up".to_string(),
        icon_url: "https://example.com/icon.png".to_string(),
        webhook,
    }
}

#[given(expr = "a {string} channel posting to {string}")]
fn channel_with_webhook(world: &mut WhatsupWorld, kind: String, webhook: String) {
    world.channels.push(channel(&kind, Some(webhook)));
}

#[given(expr = "a {string} channel without a webhook")]
fn channel_without_webhook(world: &mut WhatsupWorld, kind: String) {
    world.channels.push(channel(&kind, None));
}

#[given(expr = "the webhook {string} is unreachable")]
fn webhook_unreachable(world: &mut WhatsupWorld, webhook: String) {
    world
        .http
        .failing_webhooks
        .lock()
        .unwrap()
        .insert(webhook);
}

#[then("no notification is posted")]
fn no_notification(world: &mut WhatsupWorld) {
    let posts = world.http.posts.lock().unwrap();
    assert!(posts.is_empty(), "unexpected posts: {:?}", posts);
}

#[then(expr = "{int} notification(s) is/are posted")]
fn notification_count(world: &mut WhatsupWorld, expected: usize) {
    let posts = world.http.posts.lock().unwrap();
    assert_eq!(posts.len(), expected, "posts: {:?}", posts);
}

#[then(expr = "{string} receives the text {string}")]
fn webhook_receives(world: &mut WhatsupWorld, webhook: String, text: String) {
    let posts = world.http.posts.lock().unwrap();
    let post = posts
        .iter()
        .find(|p| p.url == webhook)
        .unwrap_or_else(|| panic!("nothing posted to {}", webhook));
    assert_eq!(post.body["text"], text.as_str());
    assert_eq!(post.body["icon_url"], "https://example.com/icon.png");
}

#[then(expr = "the run records a failed notification for {string}")]
fn failed_notification(world: &mut WhatsupWorld, kind: String) {
    let summary = world.summary.as_ref().expect("no run executed");
    let failed = summary
        .outcomes
        .iter()
        .filter_map(|o| match &o.status {
            whatsup::engine::EndpointStatus::Changed { notifications, .. } => {
                Some(notifications)
            }
            _ => None,
        })
        .flatten()
        .any(|n| n.channel == kind && !n.success);
    assert!(failed, "no failed notification for {}", kind);
}
