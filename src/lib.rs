// Copyright 2020 Boban Acimovic
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! cert-manager custom resources for the `certificates` charm relation.

#[macro_use]
extern crate log;

pub mod client;
pub mod crd;
pub mod error;
pub mod manifest;
pub mod relation;
pub mod resource;
pub mod template;

#[cfg(test)]
mod mock;

pub use client::{CustomObjectsApi, KubeApi};
pub use error::{ApiError, ManifestError, RelationError, TemplateError};
pub use manifest::{resources_from_yaml, resources_from_yaml_strict};
pub use resource::{CustomResourceInstance, Outcome, ResourceKind};
pub use template::{render_certificate, render_self_signed_issuer, CertificateRequest};
