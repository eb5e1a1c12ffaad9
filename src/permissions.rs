use crate::error::Rejection;
use crate::gate::Stage;
use crate::models::RequestDescriptor;

// Paths under a protected prefix need an admin, moderator, staff or superuser.
#[derive(Clone, Debug)]
pub struct RoleGate {
    protected_paths: Vec<String>,
}

impl RoleGate {
    pub fn new(protected_paths: Vec<String>) -> Self {
        Self { protected_paths }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

impl Stage for RoleGate {
    fn name(&self) -> &'static str {
        "role"
    }

    fn check(&self, request: &RequestDescriptor) -> Result<(), Rejection> {
        if !self.is_protected(&request.path) {
            return Ok(());
        }
        match &request.principal {
            None => Err(Rejection::AuthenticationRequired),
            Some(principal) if principal.role.can_moderate() => Ok(()),
            Some(_) => Err(Rejection::InsufficientRole),
        }
    }
}
