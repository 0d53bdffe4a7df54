// src/roles.rs

//! Role-based gating of console sections and actions.
//!
//! This only decides what the console shows and offers. The backend remains
//! the enforcement point for every operation.

use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Doctor,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewPatients,
    ViewAppointments,
    ManageAppointments,
    CompleteAppointments,
    ViewAuditLog,
    ManageDoctors,
    ViewReports,
}

/// Console navigation entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Patients,
    Appointments,
    Doctors,
    AuditLog,
    Reports,
}

const SECTIONS: [(Section, Capability); 5] = [
    (Section::Patients, Capability::ViewPatients),
    (Section::Appointments, Capability::ViewAppointments),
    (Section::Doctors, Capability::ManageDoctors),
    (Section::AuditLog, Capability::ViewAuditLog),
    (Section::Reports, Capability::ViewReports),
];

impl Role {
    pub fn parse(rol: &str) -> Self {
        match rol.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrador" => Role::Admin,
            "medico" | "doctor" => Role::Doctor,
            _ => Role::Other,
        }
    }

    pub fn can(self, cap: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::Doctor => !matches!(cap, Capability::ViewAuditLog | Capability::ManageDoctors),
            Role::Other => false,
        }
    }

    /// Only staff roles may use the console at all.
    pub fn is_console_user(self) -> bool {
        !matches!(self, Role::Other)
    }

    pub fn sections(self) -> Vec<Section> {
        SECTIONS
            .iter()
            .filter(|(_, cap)| self.can(*cap))
            .map(|(s, _)| *s)
            .collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Other => "other",
        }
    }
}

pub fn ensure(role: Role, cap: Capability) -> Result<(), ApiError> {
    if role.can(cap) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "FORBIDDEN",
            format!("role '{}' cannot access this section", role.as_str()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse(" Medico "), Role::Doctor);
        assert_eq!(Role::parse("doctor"), Role::Doctor);
        assert_eq!(Role::parse("paciente"), Role::Other);
        assert_eq!(Role::parse(""), Role::Other);
    }

    #[test]
    fn test_doctor_capabilities() {
        assert!(Role::Doctor.can(Capability::ViewPatients));
        assert!(Role::Doctor.can(Capability::CompleteAppointments));
        assert!(!Role::Doctor.can(Capability::ViewAuditLog));
        assert!(!Role::Doctor.can(Capability::ManageDoctors));
    }

    #[test]
    fn test_other_role_sees_nothing() {
        assert!(Role::Other.sections().is_empty());
        assert!(!Role::Other.is_console_user());
        assert!(ensure(Role::Other, Capability::ViewPatients).is_err());
    }

    #[test]
    fn test_sections_follow_capabilities() {
        assert_eq!(Role::Admin.sections().len(), 5);
        assert_eq!(
            Role::Doctor.sections(),
            vec![Section::Patients, Section::Appointments, Section::Reports]
        );
    }
}
