// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod cipher;
pub mod google;
pub mod google_oidc;
pub mod integration;
pub mod messaging;
pub mod scheduling;
pub mod tasks;

pub use auth::AuthService;
pub use cipher::TokenCipher;
pub use google::GoogleClient;
pub use google_oidc::{GoogleOidcVerifier, OidcError, VerifiedIdentity, VerifiedTaskPrincipal};
pub use integration::{GoogleIntegrationService, OAuthCompletion};
pub use messaging::{MessageReceipt, MessagingProvider, MessagingRegistry};
pub use scheduling::SchedulingService;
pub use tasks::{SendMessageJob, TasksService};
