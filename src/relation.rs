//! The `certificates` relation: requirers ask for a certificate, providers
//! render it and apply it to the cluster.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::client::CustomObjectsApi;
use crate::error::RelationError;
use crate::manifest::resources_from_yaml;
use crate::resource::{Outcome, ResourceKind};
use crate::template::{render_certificate, CertificateRequest};

pub const RELATION_NAME: &str = "certificates";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CertificateRequestedEvent {
    pub common_name: String,
}

impl Default for CertificateRequestedEvent {
    fn default() -> Self {
        Self {
            common_name: "hello.world".into(),
        }
    }
}

impl CertificateRequestedEvent {
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
        }
    }

    pub fn snapshot(&self) -> Value {
        serde_json::json!({ "common_name": self.common_name })
    }

    pub fn restore(snapshot: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(snapshot)
    }
}

#[derive(Debug)]
pub enum CertificatesEvent {
    CertificateRequested(CertificateRequestedEvent),
    ResourceCreated {
        kind: ResourceKind,
        name: String,
        outcome: Outcome,
    },
    ResourceDeleted {
        kind: ResourceKind,
        name: String,
        outcome: Outcome,
    },
}

/// Sending half of the relation's event bus.
#[derive(Clone, Debug)]
pub struct CertificatesEvents {
    tx: UnboundedSender<CertificatesEvent>,
}

pub fn certificates_events() -> (CertificatesEvents, UnboundedReceiver<CertificatesEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CertificatesEvents { tx }, rx)
}

impl CertificatesEvents {
    pub fn emit(&self, event: CertificatesEvent) -> Result<(), RelationError> {
        self.tx.send(event).map_err(|_| RelationError::Closed)
    }
}

pub struct CertificatesRequires {
    events: CertificatesEvents,
}

impl CertificatesRequires {
    pub fn new(events: CertificatesEvents) -> Self {
        Self { events }
    }

    pub fn request_certificate(&self, common_name: impl Into<String>) -> Result<(), RelationError> {
        let event = CertificateRequestedEvent::new(common_name);
        debug!("{}: requesting certificate for {}", RELATION_NAME, event.common_name);
        self.events.emit(CertificatesEvent::CertificateRequested(event))
    }
}

pub struct CertificatesProvides {
    namespace: String,
    defaults: CertificateRequest,
    events: CertificatesEvents,
}

impl CertificatesProvides {
    /// `namespace` is the model the certificates are created in.
    pub fn new(
        namespace: impl Into<String>,
        defaults: CertificateRequest,
        events: CertificatesEvents,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            defaults,
            events,
        }
    }

    pub fn request_for(&self, event: &CertificateRequestedEvent) -> CertificateRequest {
        CertificateRequest {
            name: event.common_name.clone(),
            common_name: event.common_name.clone(),
            namespace: self.namespace.clone(),
            ..self.defaults.clone()
        }
    }

    /// Render and create the certificate. Returns how many resources were submitted.
    pub async fn on_certificate_requested<C>(
        &self,
        event: &CertificateRequestedEvent,
        api: &C,
    ) -> Result<usize, RelationError>
    where
        C: CustomObjectsApi + ?Sized,
    {
        info!("{}: certificate requested for {}", RELATION_NAME, event.common_name);
        let raw = render_certificate(&self.request_for(event))?;
        let resources = resources_from_yaml(&raw)?;

        for resource in resources.iter() {
            let outcome = resource.create(api).await;
            self.complete(CertificatesEvent::ResourceCreated {
                kind: resource.kind(),
                name: resource.full_name(),
                outcome,
            });
        }
        Ok(resources.len())
    }

    /// Delete whatever [`Self::on_certificate_requested`] would create for `event`.
    pub async fn release<C>(
        &self,
        event: &CertificateRequestedEvent,
        api: &C,
    ) -> Result<usize, RelationError>
    where
        C: CustomObjectsApi + ?Sized,
    {
        info!("releasing certificate for {}", event.common_name);
        let raw = render_certificate(&self.request_for(event))?;
        let resources = resources_from_yaml(&raw)?;

        for resource in resources.iter().rev() {
            let outcome = resource.delete(api).await;
            self.complete(CertificatesEvent::ResourceDeleted {
                kind: resource.kind(),
                name: resource.full_name(),
                outcome,
            });
        }
        Ok(resources.len())
    }

    pub async fn dispatch<C>(&self, event: &CertificatesEvent, api: &C) -> Result<(), RelationError>
    where
        C: CustomObjectsApi + ?Sized,
    {
        if let CertificatesEvent::CertificateRequested(requested) = event {
            self.on_certificate_requested(requested, api).await?;
        }
        Ok(())
    }

    /// Handle every queued event, including completions raised while handling.
    /// Completion events are handed back to the caller. A request that cannot
    /// be handled is logged and the rest of the queue is still drained.
    pub async fn process_pending<C>(
        &self,
        rx: &mut UnboundedReceiver<CertificatesEvent>,
        api: &C,
    ) -> Vec<CertificatesEvent>
    where
        C: CustomObjectsApi + ?Sized,
    {
        let mut completed = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                CertificatesEvent::CertificateRequested(ref requested) => {
                    if let Err(e) = self.dispatch(&event, api).await {
                        error!("failed handling request for {}: {}", requested.common_name, e);
                    }
                }
                other => completed.push(other),
            }
        }
        completed
    }

    fn complete(&self, event: CertificatesEvent) {
        if let Err(e) = self.events.emit(event) {
            warn!("dropping completion event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, RecordingApi};

    fn provider() -> (
        CertificatesProvides,
        CertificatesRequires,
        UnboundedReceiver<CertificatesEvent>,
    ) {
        let (events, rx) = certificates_events();
        let provides =
            CertificatesProvides::new("model-a", CertificateRequest::default(), events.clone());
        (provides, CertificatesRequires::new(events), rx)
    }

    #[test]
    fn requested_event_snapshot_restores() {
        let event = CertificateRequestedEvent::new("web.unit");
        let snapshot = event.snapshot();

        assert_eq!(snapshot["common_name"], "web.unit");
        assert_eq!(CertificateRequestedEvent::restore(&snapshot).unwrap(), event);
        assert!(CertificateRequestedEvent::restore(&serde_json::json!({})).is_err());
        assert_eq!(CertificateRequestedEvent::default().common_name, "hello.world");
    }

    #[tokio::test]
    async fn request_is_relayed_to_cluster() {
        let (provides, requires, mut rx) = provider();
        let api = RecordingApi::default();

        requires.request_certificate("web.unit").unwrap();
        let completed = provides.process_pending(&mut rx, &api).await;

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            Call::CreateNamespaced {
                namespace,
                plural,
                body,
                ..
            } => {
                assert_eq!(namespace, "model-a");
                assert_eq!(plural, "certificates");
                assert_eq!(body["metadata"]["name"], "web.unit");
                assert_eq!(body["spec"]["commonName"], "web.unit");
            }
            other => panic!("unexpected call {:?}", other),
        }

        assert_eq!(completed.len(), 1);
        match &completed[0] {
            CertificatesEvent::ResourceCreated {
                kind,
                name,
                outcome,
            } => {
                assert_eq!(*kind, ResourceKind::Certificate);
                assert_eq!(name, "model-a/web.unit");
                assert!(matches!(outcome, Outcome::Done));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn pending_queue_is_drained_past_failures() {
        let (provides, requires, mut rx) = provider();
        let api = RecordingApi::failing_with(500);

        provides.complete(CertificatesEvent::ResourceDeleted {
            kind: ResourceKind::Certificate,
            name: "model-a/old.unit".into(),
            outcome: Outcome::AlreadyAbsent,
        });
        requires.request_certificate("a.unit").unwrap();
        requires.request_certificate("b.unit").unwrap();

        let completed = provides.process_pending(&mut rx, &api).await;

        assert_eq!(api.calls().len(), 2);
        let names: Vec<_> = completed
            .iter()
            .map(|event| match event {
                CertificatesEvent::ResourceCreated { name, outcome, .. } => {
                    assert!(outcome.is_failed());
                    name.as_str()
                }
                CertificatesEvent::ResourceDeleted { name, .. } => name.as_str(),
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(
            names,
            vec!["model-a/old.unit", "model-a/a.unit", "model-a/b.unit"]
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_create_is_still_completed() {
        let (provides, _requires, mut rx) = provider();
        let api = RecordingApi::failing_with(403);

        let submitted = provides
            .on_certificate_requested(&CertificateRequestedEvent::default(), &api)
            .await
            .unwrap();

        assert_eq!(submitted, 1);
        match rx.try_recv().unwrap() {
            CertificatesEvent::ResourceCreated { outcome, .. } => assert!(outcome.is_failed()),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn release_deletes_rendered_certificate() {
        let (provides, _requires, mut rx) = provider();
        let api = RecordingApi::failing_with(404);

        provides
            .release(&CertificateRequestedEvent::new("gone.unit"), &api)
            .await
            .unwrap();

        assert_eq!(
            api.calls(),
            vec![Call::DeleteNamespaced {
                group: "cert-manager.io".into(),
                version: "v1".into(),
                namespace: "model-a".into(),
                plural: "certificates".into(),
                name: "gone.unit".into(),
            }]
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            CertificatesEvent::ResourceDeleted {
                outcome: Outcome::AlreadyAbsent,
                ..
            }
        ));
    }

    #[test]
    fn request_fails_once_bus_is_gone() {
        let (events, rx) = certificates_events();
        drop(rx);
        let requires = CertificatesRequires::new(events);
        assert!(matches!(
            requires.request_certificate("x"),
            Err(RelationError::Closed)
        ));
    }
}
