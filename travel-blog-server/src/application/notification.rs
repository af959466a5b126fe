use crate::domain::{EmailMessage, Post, User};

/// Outbound notifications. Publishing never blocks the caller and never
/// fails from the caller's point of view; delivery problems are the
/// adapter's to log.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, message: EmailMessage);
}

pub fn post_created_message(post: &Post, author: &User) -> EmailMessage {
    EmailMessage {
        subject: format!("New post published: {}", post.title),
        content: format!(
            "{} published a new post about {} on {}.",
            author.name, post.country, post.created_at
        ),
        recipients_emails: vec![author.email.clone()],
    }
}
