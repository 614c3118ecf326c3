//! services/api/src/adapters/push.rs
//!
//! Concrete implementation of the `PushDelivery` port using the Web Push
//! protocol: VAPID-signed, aes128gcm-encrypted requests to the browser
//! push services.

use async_trait::async_trait;
use chief_of_staff_core::domain::{NotificationPayload, PushSubscription};
use chief_of_staff_core::ports::{DeliveryError, PushDelivery};
use web_push::{
    ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushClient, WebPushError,
    WebPushMessageBuilder,
};

use crate::config::VapidConfig;

/// A push delivery adapter that signs each request with the configured
/// VAPID key pair.
pub struct WebPushAdapter {
    client: WebPushClient,
    vapid: VapidConfig,
}

impl WebPushAdapter {
    pub fn new(vapid: VapidConfig) -> Result<Self, WebPushError> {
        Ok(Self {
            client: WebPushClient::new()?,
            vapid,
        })
    }
}

#[async_trait]
impl PushDelivery for WebPushAdapter {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError> {
        let subscription_info = SubscriptionInfo::new(
            &subscription.endpoint,
            &subscription.keys.p256dh,
            &subscription.keys.auth,
        );

        let body = serde_json::to_string(payload)
            .map_err(|e| DeliveryError::Failed(format!("Payload serialization failed: {}", e)))?;

        let mut signature_builder = VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            web_push::URL_SAFE_NO_PAD,
            &subscription_info,
        )
        .map_err(|e| DeliveryError::Failed(format!("Invalid VAPID key: {}", e)))?;
        signature_builder.add_claim("sub", self.vapid.subject.as_str());
        let signature = signature_builder
            .build()
            .map_err(|e| DeliveryError::Failed(format!("VAPID signing failed: {}", e)))?;

        let mut message = WebPushMessageBuilder::new(&subscription_info)
            .map_err(|e| DeliveryError::Failed(e.to_string()))?;
        message.set_payload(ContentEncoding::Aes128Gcm, body.as_bytes());
        message.set_vapid_signature(signature);
        let message = message
            .build()
            .map_err(|e| DeliveryError::Failed(e.to_string()))?;

        match self.client.send(message).await {
            Ok(()) => Ok(()),
            Err(WebPushError::EndpointNotValid) => Err(DeliveryError::Gone(410)),
            Err(WebPushError::EndpointNotFound) => Err(DeliveryError::Gone(404)),
            Err(e) => Err(DeliveryError::Failed(e.to_string())),
        }
    }
}

/// Stand-in used when no VAPID keys are configured. Every delivery fails,
/// which keeps the scheduler's counters honest without touching the network.
pub struct DisabledPushAdapter;

#[async_trait]
impl PushDelivery for DisabledPushAdapter {
    async fn deliver(
        &self,
        _subscription: &PushSubscription,
        _payload: &NotificationPayload,
    ) -> Result<(), DeliveryError> {
        Err(DeliveryError::Failed(
            "VAPID keys not configured - push notifications disabled".to_string(),
        ))
    }
}
