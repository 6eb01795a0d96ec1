//! Admission notifications: templating, composition, and delivery.
//!
//! - [`TemplateSet`] holds one text template per [`OutcomeCategory`]
//! - [`Composer`] renders an evaluated request into message text
//! - [`Notifier`] is the pluggable delivery channel
//! - [`Dispatcher`] fans a [`Notification`] out to every recipient

#![warn(missing_docs, clippy::pedantic)]

pub mod composer;
pub mod dispatcher;
pub mod notifier;
pub mod template;

pub use composer::{Composer, NotificationContext, category_for, result_label};
pub use dispatcher::{DeliveryResult, DispatchReport, Dispatcher};
pub use notifier::{
    LogNotifier, Notification, Notifier, NotifyError, RecordingNotifier, SentMessage,
    private_address,
};
pub use template::{NotificationTemplate, OutcomeCategory, Placeholder, TemplateSet, TemplateVars};
