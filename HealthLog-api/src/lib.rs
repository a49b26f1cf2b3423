// HealthLog API
// HTTP surface over the domain services: routing, handlers, public entities
// and the OpenAPI document.

pub mod api;
pub mod entities;
pub mod openapi;
