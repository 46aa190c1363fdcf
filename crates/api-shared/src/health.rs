use crate::pb::HealthRes;

/// Liveness check shared by the gRPC and REST APIs.
///
/// Always healthy while the process is serving; store reachability is not probed.
#[derive(Clone, Debug, Default)]
pub struct HealthService;

impl HealthService {
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Front desk is alive".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_is_ok() {
        let res = HealthService::check_health();
        assert!(res.ok);
        assert!(!res.message.is_empty());
    }
}
