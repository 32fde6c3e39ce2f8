use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Simple health service shared by API surfaces.
#[derive(Clone, Copy, Debug)]
pub struct HealthService;

impl HealthService {
    /// Check health without creating an instance.
    ///
    /// `mock` reports whether the scan backend is serving fixtures, so monitoring can flag a
    /// deployment that is running without an LLM credential.
    pub fn check_health(mock: bool) -> HealthRes {
        HealthRes {
            ok: true,
            message: if mock {
                "MTF scan service is alive (MOCK LLM backend)".into()
            } else {
                "MTF scan service is alive".into()
            },
        }
    }
}
