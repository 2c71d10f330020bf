//! # OCPP Core
//!
//! Feature registry and declarative payload validation for OCPP 1.6.
//!
//! Every supported action is described once by a [`Feature`]: its typed
//! request and confirmation, who initiates it, which profile it belongs to and
//! the schemas its payloads must satisfy. Schemas attach rules by name from a
//! [`RuleCatalog`]; some of those rules (the `messageTrigger` enumeration) read
//! their legal values from the [`FeatureRegistry`] itself at validation time.
//!
//! ## Architecture
//!
//! ```text
//!  transport (WebSocket, files, tests)
//!        │ OCPP-J frames
//!        ▼
//! ┌──────────────────────────────────────┐
//! │  messages   Call / CallResult / Error│
//! │  dispatch   lookup → validate → decode
//! └─────────────┬────────────────────────┘
//!               ▼
//! ┌──────────────────────────────────────┐
//! │  registry   action → descriptor      │
//! │  validator  schema × payload → errors│
//! │  rules      named rule catalog       │
//! │  ocpp16     feature catalog          │
//! └──────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```
//! use ocpp_core::{ocpp16, validate, CatalogConfig};
//! use ocpp_core::ocpp16::{actions, TriggerMessageRequest};
//!
//! let catalog = ocpp16::bootstrap(&CatalogConfig::default())?;
//! let schema = catalog.registry.lookup(actions::TRIGGER_MESSAGE)?.request_schema();
//!
//! let request = TriggerMessageRequest::new(actions::BOOT_NOTIFICATION);
//! assert!(validate(&request, schema, &catalog.registry).is_ok());
//! # Ok::<(), ocpp_core::CoreError>(())
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod feature;
pub mod messages;
pub mod ocpp16;
pub mod registry;
pub mod rules;
pub mod schema;
pub mod validator;

pub use config::CatalogConfig;
pub use dispatch::{DispatchError, Dispatcher};
pub use error::{CoreError, ValidationErrors, Violation};
pub use feature::{AnyPayload, Feature, FeatureDescriptor, Initiator, PayloadType, Profile};
pub use messages::{Call, CallError, CallResult, ErrorCode, FrameError, OcppMessage};
pub use registry::{FeatureRegistry, SharedRegistry};
pub use rules::{Format, Resolver, Rule, RuleCatalog, RuleContext};
pub use schema::{FieldSpec, FieldValue, Payload, PayloadSchema, SchemaSpec};
pub use validator::{validate, ValidationResult};
