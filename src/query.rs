// src/query.rs

//! Pagination and filter normalization for the paginated list endpoints.
//!
//! Raw UI parameters arrive as loosely-typed strings. Nothing here ever fails:
//! bad input degrades to a safe default so a list can always be rendered.

use std::collections::HashMap;

use chrono::NaiveDate;

/// Raw query parameters as received from the browser.
pub type RawParams = HashMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSizes {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl PageSizes {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(default_limit: u32, max_limit: u32) -> Self {
        let max_limit = max_limit.max(1);
        let default_limit = default_limit.clamp(1, max_limit);
        Self {
            default_limit,
            max_limit,
        }
    }
}

impl Default for PageSizes {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, Self::MAX_LIMIT)
    }
}

/* ============================================================
   Filter schemas
   ============================================================ */

#[derive(Clone, Copy, Debug)]
pub enum FilterKind {
    /// Free text, trimmed and cut to `max_len` characters.
    Text { max_len: usize },
    /// One of a fixed set; `all` is the "no filter" sentinel.
    Choice {
        allowed: &'static [&'static str],
        all: &'static str,
    },
    /// Strict `YYYY-MM-DD`.
    Date,
    /// Positive integer foreign key.
    Id,
}

#[derive(Clone, Copy, Debug)]
pub struct FilterSpec {
    pub key: &'static str,
    pub kind: FilterKind,
}

const fn text(key: &'static str, max_len: usize) -> FilterSpec {
    FilterSpec {
        key,
        kind: FilterKind::Text { max_len },
    }
}

const fn date(key: &'static str) -> FilterSpec {
    FilterSpec {
        key,
        kind: FilterKind::Date,
    }
}

const fn id(key: &'static str) -> FilterSpec {
    FilterSpec {
        key,
        kind: FilterKind::Id,
    }
}

pub const APPOINTMENT_STATUSES: &[&str] =
    &["pendiente", "confirmada", "atendida", "cancelada", "no_asistio"];

const AUDIT_ACTIONS: &[&str] = &["crear", "actualizar", "eliminar", "login", "logout"];

const PATIENT_FILTERS: &[FilterSpec] = &[
    text("busqueda", 100),
    text("documento", 20),
    id("medico_id"),
    id("modulo_id"),
];

const APPOINTMENT_FILTERS: &[FilterSpec] = &[
    text("busqueda", 100),
    FilterSpec {
        key: "estado",
        kind: FilterKind::Choice {
            allowed: APPOINTMENT_STATUSES,
            all: "todas",
        },
    },
    date("fecha_desde"),
    date("fecha_hasta"),
    id("medico_id"),
    id("paciente_id"),
];

const AUDIT_FILTERS: &[FilterSpec] = &[
    text("usuario", 100),
    text("entidad", 50),
    FilterSpec {
        key: "accion",
        kind: FilterKind::Choice {
            allowed: AUDIT_ACTIONS,
            all: "todas",
        },
    },
    date("fecha_desde"),
    date("fecha_hasta"),
];

const DOCTOR_FILTERS: &[FilterSpec] = &[
    text("busqueda", 200),
    text("especialidad", 60),
    id("modulo_id"),
];

/// The paginated collections exposed by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    Patients,
    Appointments,
    AuditLog,
    Doctors,
}

impl ListKind {
    /// Backend path, also the JSON key the items are listed under.
    pub fn resource(self) -> &'static str {
        match self {
            ListKind::Patients => "pacientes",
            ListKind::Appointments => "citas",
            ListKind::AuditLog => "auditoria",
            ListKind::Doctors => "medicos",
        }
    }

    pub fn filters(self) -> &'static [FilterSpec] {
        match self {
            ListKind::Patients => PATIENT_FILTERS,
            ListKind::Appointments => APPOINTMENT_FILTERS,
            ListKind::AuditLog => AUDIT_FILTERS,
            ListKind::Doctors => DOCTOR_FILTERS,
        }
    }
}

/* ============================================================
   Primitive normalizers
   ============================================================ */

/// Leading-integer parse: optional sign, then leading digits, rest ignored.
fn leading_int(value: &str) -> Option<i64> {
    let s = value.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude = rest[..digits_len].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Parses `value` as a base-10 integer, returning `fallback` for anything
/// missing, non-numeric, zero or negative.
pub fn parse_positive_int(value: Option<&str>, fallback: u32) -> u32 {
    match value.and_then(leading_int) {
        Some(n) if n >= 1 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => fallback,
    }
}

fn parse_offset(value: Option<&str>) -> Option<u64> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    leading_int(raw)
        .filter(|n| *n >= 0)
        .map(|n| n as u64)
}

pub fn normalize_text(value: &str, max_len: usize) -> Option<String> {
    let cleaned: String = value.chars().filter(|c| !c.is_control()).collect();
    let cut: String = cleaned.trim().chars().take(max_len).collect();
    let cut = cut.trim_end();
    (!cut.is_empty()).then(|| cut.to_string())
}

pub fn normalize_date(value: &str) -> Option<String> {
    let v = value.trim();
    let b = v.as_bytes();
    let shaped = b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(v, "%Y-%m-%d").ok()?;
    Some(v.to_string())
}

fn normalize_filter(spec: &FilterSpec, value: &str) -> Option<String> {
    match spec.kind {
        FilterKind::Text { max_len } => normalize_text(value, max_len),
        FilterKind::Choice { allowed, all } => {
            let v = value.trim();
            (v != all && allowed.contains(&v)).then(|| v.to_string())
        }
        FilterKind::Date => normalize_date(value),
        FilterKind::Id => match parse_positive_int(Some(value), 0) {
            0 => None,
            n => Some(n.to_string()),
        },
    }
}

/* ============================================================
   Normalized request
   ============================================================ */

/// Bounded, well-formed list request. Built fresh per fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationRequest {
    pub page: u32,
    pub limit: u32,
    pub offset: u64,
    filters: Vec<(&'static str, String)>,
}

impl PaginationRequest {
    pub fn normalize(kind: ListKind, raw: &RawParams, sizes: PageSizes) -> Self {
        let get = |key: &str| raw.get(key).map(String::as_str);

        let limit = parse_positive_int(get("limit"), sizes.default_limit).min(sizes.max_limit);
        let page = parse_positive_int(get("page"), 1);
        let offset = parse_offset(get("offset"))
            .unwrap_or_else(|| (page as u64 - 1) * limit as u64);

        let filters = kind
            .filters()
            .iter()
            .filter_map(|spec| {
                let value = get(spec.key)?;
                normalize_filter(spec, value).map(|v| (spec.key, v))
            })
            .collect();

        Self {
            page,
            limit,
            offset,
            filters,
        }
    }

    #[cfg(test)]
    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets (or replaces) a filter after normalization, keeping its position.
    pub fn set_filter(&mut self, key: &'static str, value: String) {
        match self.filters.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.filters.push((key, value)),
        }
    }

    /// `limit`, `offset`, then present filters in schema order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        out.extend(self.filters.iter().cloned());
        out
    }

    pub fn to_query_string(&self) -> String {
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.pairs() {
            ser.append_pair(k, &v);
        }
        ser.finish()
    }
}
