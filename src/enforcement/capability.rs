/// Unforgeable clearance. Proof that the enforcement layer has evaluated
/// a principal against a controller action and found its tier sufficient.
///
/// Construction is double-locked:
/// 1. `Seal` is a private type, so struct literal construction from outside this file is impossible.
/// 2. `new()` is `pub(super)`, so only `enforcement/` submodules can call it.
///
/// No `Clone`, `Copy`, `Default`, or `From`. A clearance is consumed on use.
///
/// ```compile_fail,E0624
/// use tierguard::enforcement::capability::Clearance;
///
/// // new() is pub(super), not pub.
/// let _clearance = Clearance::new("posts", "show", "staff");
/// ```
#[derive(Debug)]
pub struct Clearance {
    controller: String,
    action: String,
    tier: String,
    _seal: Seal,
}

#[derive(Debug)]
struct Seal;

impl Clearance {
    pub(super) fn new(controller: &str, action: &str, tier: &str) -> Self {
        Self {
            controller: controller.to_owned(),
            action: action.to_owned(),
            tier: tier.to_owned(),
            _seal: Seal,
        }
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Minimum tier the action required.
    pub fn tier(&self) -> &str {
        &self.tier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearance_carries_decision() {
        let clearance = Clearance::new("posts", "show", "staff");
        assert_eq!(clearance.controller(), "posts");
        assert_eq!(clearance.action(), "show");
        assert_eq!(clearance.tier(), "staff");
    }

    #[test]
    fn clearance_is_consumed() {
        let clearance = Clearance::new("posts", "show", "staff");
        // Move the clearance into a function. If Clearance were Copy/Clone,
        // using `clearance` again below would still compile.
        let _tier = consume(clearance);
        // Uncommenting the next line would fail to compile: clearance has been moved.
        // let _ = clearance.tier();
    }

    fn consume(clearance: Clearance) -> String {
        clearance.tier
    }
}
