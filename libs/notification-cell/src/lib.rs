pub mod models;
pub mod services;

pub use models::*;
pub use services::{
    calendar::CalendarNotifier, dispatcher::NotificationDispatcher, email::EmailNotifier,
    slack::SlackNotifier, Notifier,
};
