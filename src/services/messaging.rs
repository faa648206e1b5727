// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound messaging providers and the name-keyed registry the worker uses.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const STUB_WHATSAPP: &str = "stub_whatsapp";

/// What a provider reports after accepting a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReceipt {
    pub provider: String,
    pub status: String,
    pub to: String,
    pub message: String,
}

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Registry key (lower-case).
    fn name(&self) -> &str;

    async fn send_message(&self, user_id: Option<i64>, to: &str, text: &str)
        -> Result<MessageReceipt>;
}

/// Logs the message and reports it as sent. Nothing leaves the process.
pub struct StubWhatsAppProvider;

#[async_trait]
impl MessagingProvider for StubWhatsAppProvider {
    fn name(&self) -> &str {
        STUB_WHATSAPP
    }

    async fn send_message(
        &self,
        user_id: Option<i64>,
        to: &str,
        text: &str,
    ) -> Result<MessageReceipt> {
        tracing::info!(?user_id, to, chars = text.chars().count(), "Stub WhatsApp send");
        Ok(MessageReceipt {
            provider: "whatsapp:stub".to_string(),
            status: "sent".to_string(),
            to: to.to_string(),
            message: text.to_string(),
        })
    }
}

/// Providers by lower-case name plus the configured default.
#[derive(Clone)]
pub struct MessagingRegistry {
    providers: HashMap<String, Arc<dyn MessagingProvider>>,
    default_provider: String,
}

impl MessagingRegistry {
    pub fn new(default_provider: &str) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.trim().to_lowercase(),
        }
    }

    /// Registry with every built-in provider.
    pub fn with_builtin(default_provider: &str) -> Self {
        let mut registry = Self::new(default_provider);
        registry.register(Arc::new(StubWhatsAppProvider));
        registry
    }

    pub fn register(&mut self, provider: Arc<dyn MessagingProvider>) {
        self.providers
            .insert(provider.name().to_lowercase(), provider);
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    /// Look up a provider by name, or the default when `name` is absent.
    pub fn get(&self, name: Option<&str>) -> Result<Arc<dyn MessagingProvider>> {
        let key = name
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.default_provider.clone());

        self.providers
            .get(&key)
            .cloned()
            .ok_or_else(|| AppError::BadRequest(format!("Unknown messaging provider: {key}")))
    }
}
