//! Typed dispatch through the registry
//!
//! The dispatcher is the seam between the transport and the core:
//! outbound payloads are validated before they are framed, inbound payloads
//! are looked up, validated and only then decoded into their typed form.
//! Failures on the inbound side come back as a ready-to-send [`CallError`].

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::CoreError;
use crate::feature::{AnyPayload, Feature, FeatureDescriptor};
use crate::messages::{Call, CallError, CallResult, ErrorCode, FrameError};
use crate::registry::FeatureRegistry;
use crate::validator::validate;

/// Failure on the local side of a dispatch
///
/// Frame errors (the payload could not be encoded or decoded) are kept apart
/// from core errors (unknown action, failed validation).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Validating front end over a populated registry
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    registry: &'a FeatureRegistry,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a FeatureRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'a FeatureRegistry {
        self.registry
    }

    /// Validate an outgoing request and frame it as a CALL
    pub fn call<F: Feature>(&self, request: &F::Request) -> Result<Call, DispatchError> {
        let descriptor = self.registry.lookup(F::ACTION)?;
        validate(request, descriptor.request_schema(), self.registry).map_err(CoreError::from)?;
        Ok(Call::new(F::ACTION, request)?)
    }

    /// Validate an outgoing confirmation and frame it as a CALLRESULT
    pub fn call_result<F: Feature>(
        &self,
        message_id: impl Into<String>,
        confirmation: &F::Confirmation,
    ) -> Result<CallResult, DispatchError> {
        let descriptor = self.registry.lookup(F::ACTION)?;
        validate(confirmation, descriptor.confirmation_schema(), self.registry)
            .map_err(CoreError::from)?;
        Ok(CallResult::new(message_id, confirmation)?)
    }

    /// Look up, validate and decode an inbound CALL
    ///
    /// Only the descriptor is returned; a CALL accepted here always decodes.
    pub fn accept(&self, call: &Call) -> Result<&'a FeatureDescriptor, CallError> {
        self.admit(call).map(|(descriptor, _)| descriptor)
    }

    /// Accept an inbound CALL and decode its payload without knowing the feature
    pub fn decode(&self, call: &Call) -> Result<Box<dyn AnyPayload>, CallError> {
        self.admit(call).map(|(_, payload)| payload)
    }

    /// Accept an inbound CALL for a known feature and decode it
    pub fn decode_as<F: Feature>(&self, call: &Call) -> Result<F::Request, CallError> {
        if call.action != F::ACTION {
            return Err(CallError::new(
                call.message_id.clone(),
                ErrorCode::ProtocolError,
                format!("Expected {}, got {}", F::ACTION, call.action),
            ));
        }
        self.check(call)?;
        serde_json::from_value(call.payload.clone())
            .map_err(|e| CallError::from_frame(call.message_id.clone(), &FrameError::from(e)))
    }

    /// Validate and decode the CALLRESULT answering a request for `F`
    pub fn confirmation<F: Feature>(&self, result: &CallResult) -> Result<F::Confirmation, DispatchError> {
        self.confirmation_payload::<F>(&result.payload)
    }

    fn confirmation_payload<F: Feature>(&self, payload: &Value) -> Result<F::Confirmation, DispatchError> {
        let descriptor = self.registry.lookup(F::ACTION)?;
        validate(payload, descriptor.confirmation_schema(), self.registry).map_err(CoreError::from)?;
        Ok(serde_json::from_value(payload.clone()).map_err(FrameError::from)?)
    }

    fn check(&self, call: &Call) -> Result<&'a FeatureDescriptor, CallError> {
        let descriptor = self
            .registry
            .lookup(&call.action)
            .map_err(|e| self.reject(call, e))?;

        validate(&call.payload, descriptor.request_schema(), self.registry)
            .map_err(|errors| self.reject(call, errors.into()))?;

        Ok(descriptor)
    }

    fn admit(&self, call: &Call) -> Result<(&'a FeatureDescriptor, Box<dyn AnyPayload>), CallError> {
        let descriptor = self.check(call)?;
        let payload = descriptor.request_type().decode(call.payload.clone()).map_err(|e| {
            debug!("Rejecting {} ({}): {}", call.action, call.message_id, e);
            CallError::from_frame(call.message_id.clone(), &FrameError::from(e))
        })?;

        Ok((descriptor, payload))
    }

    fn reject(&self, call: &Call, error: CoreError) -> CallError {
        debug!("Rejecting {} ({}): {}", call.action, call.message_id, error);
        CallError::from_core(call.message_id.clone(), &error)
    }
}
