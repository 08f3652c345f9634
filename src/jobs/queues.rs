//! Conversion queues and plan lookup.

use serde::Serialize;

/// A named queue with a concurrency ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConversionQueue {
    pub name: &'static str,
    pub concurrency_limit: u32,
}

pub const FILE_CONVERSION: ConversionQueue = queue("file-conversion", 10);
pub const CAD_CONVERSION: ConversionQueue = queue("cad-conversion", 2);
pub const FREE: ConversionQueue = queue("conversion-free", 1);
pub const STARTER: ConversionQueue = queue("conversion-starter", 1);
pub const PRO: ConversionQueue = queue("conversion-pro", 2);
pub const BUSINESS: ConversionQueue = queue("conversion-business", 10);
pub const DATAROOMS: ConversionQueue = queue("conversion-datarooms", 10);
pub const DATAROOMS_PLUS: ConversionQueue = queue("conversion-datarooms-plus", 10);

pub const QUEUES: &[ConversionQueue] = &[
    FILE_CONVERSION,
    CAD_CONVERSION,
    FREE,
    STARTER,
    PRO,
    BUSINESS,
    DATAROOMS,
    DATAROOMS_PLUS,
];

const fn queue(name: &'static str, concurrency_limit: u32) -> ConversionQueue {
    ConversionQueue {
        name,
        concurrency_limit,
    }
}

/// Plan name without add-on suffixes (`pro+old` → `pro`).
fn base_plan(plan: &str) -> &str {
    plan.split('+').next().unwrap_or(plan)
}

/// Queue for a billing plan. Unknown plans share the free queue.
pub fn queue_for_plan(plan: &str) -> ConversionQueue {
    match base_plan(plan) {
        "starter" => STARTER,
        "pro" => PRO,
        "business" => BUSINESS,
        "datarooms" => DATAROOMS,
        "datarooms-plus" => DATAROOMS_PLUS,
        _ => FREE,
    }
}

/// Queue name derived from the plan without checking it exists.
pub fn queue_name_for_plan(plan: &str) -> String {
    format!("conversion-{}", base_plan(plan))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_lookup() {
        assert_eq!(queue_for_plan("pro"), PRO);
        assert_eq!(queue_for_plan("business+old"), BUSINESS);
        assert_eq!(queue_for_plan("datarooms-plus"), DATAROOMS_PLUS);
        assert_eq!(queue_for_plan("enterprise"), FREE);
        assert_eq!(queue_for_plan(""), FREE);
    }

    #[test]
    fn test_queue_name_is_unchecked() {
        assert_eq!(queue_name_for_plan("pro+old"), "conversion-pro");
        assert_eq!(queue_name_for_plan("enterprise"), "conversion-enterprise");
    }

    #[test]
    fn test_every_plan_queue_is_listed() {
        for plan in ["free", "starter", "pro", "business", "datarooms", "datarooms-plus"] {
            let q = queue_for_plan(plan);
            assert!(QUEUES.contains(&q));
            assert_eq!(q.name, queue_name_for_plan(plan));
        }
    }
}
