//! Decides which environment a run should use.
//!
//! The provider caps the number of environments attached to a VPC, so the
//! policy prefers reusing an exact match, then recreating the tool's own
//! environment, and refuses to create a new one when the cap is already
//! taken by unrelated environments. [`decide`] performs no I/O; the caller
//! carries out the deletion or creation it asks for.

use crate::environment::{Environment, VpcConfig};

/// Default name identifying the environment this tool manages.
pub const DEFAULT_ENVIRONMENT_NAME: &str = "cloudshell-local";

/// Maximum number of VPC environments the provider allows at once.
pub const MAX_VPC_ENVIRONMENTS: usize = 2;

/// Outcome of reconciling the desired configuration with existing records.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Decision {
    /// An environment with the exact configuration already exists.
    UseExisting(Environment),
    /// The tool's own environment exists with a different configuration; it
    /// must be deleted and created again.
    RecreateThenUse(Environment),
    /// No suitable environment exists and there is room for a new one.
    CreateNew,
    /// Unrelated VPC environments already occupy every slot.
    Abort {
        /// Number of unrelated environments carrying a VPC configuration.
        configured: usize,
    },
}

/// Chooses how to obtain an environment matching `desired`.
///
/// Records without a VPC configuration are ignored. The first record whose
/// configuration equals `desired` wins; failing that, the first configured
/// record named `fixed_name` is recreated. When nothing was selected and
/// [`MAX_VPC_ENVIRONMENTS`] or more other configured environments exist, the
/// run aborts.
#[must_use]
pub fn decide(desired: &VpcConfig, existing: &[Environment], fixed_name: &str) -> Decision {
    let configured = existing
        .iter()
        .filter_map(|env| env.vpc_config.as_ref().map(|vpc| (env, vpc)));

    let mut exact = None;
    let mut named = None;
    let mut others = 0_usize;
    for (env, vpc) in configured {
        if vpc == desired {
            exact = exact.or(Some(env));
        } else if env.is_named(fixed_name) {
            named = named.or(Some(env));
        } else {
            others += 1;
        }
    }

    if let Some(env) = exact {
        return Decision::UseExisting(env.clone());
    }
    if let Some(env) = named {
        return Decision::RecreateThenUse(env.clone());
    }
    if others >= MAX_VPC_ENVIRONMENTS {
        return Decision::Abort { configured: others };
    }
    Decision::CreateNew
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn env(id: &str, name: Option<&str>, vpc: Option<VpcConfig>) -> Environment {
        Environment {
            environment_id: id.to_owned(),
            environment_name: name.map(str::to_owned),
            vpc_config: vpc,
        }
    }

    #[fixture]
    fn desired() -> VpcConfig {
        VpcConfig::new("vpc-1", ["subnet-a", "subnet-b"], ["sg-x"])
    }

    fn other_vpc(n: u8) -> VpcConfig {
        VpcConfig::new(format!("vpc-other-{n}"), ["subnet-z"], ["sg-z"])
    }

    #[rstest]
    fn empty_listing_creates_new(desired: VpcConfig) {
        assert_eq!(
            decide(&desired, &[], DEFAULT_ENVIRONMENT_NAME),
            Decision::CreateNew
        );
    }

    #[rstest]
    fn exact_match_is_reused_regardless_of_order(desired: VpcConfig) {
        let reordered = VpcConfig::new("vpc-1", ["subnet-b", "subnet-a"], ["sg-x"]);
        let matching = env("env-match", Some("someone-else"), Some(reordered));
        let mut records = vec![
            env("env-a", None, Some(other_vpc(1))),
            env("env-b", Some("default"), None),
            env("env-c", None, Some(other_vpc(2))),
            matching.clone(),
        ];

        assert_eq!(
            decide(&desired, &records, DEFAULT_ENVIRONMENT_NAME),
            Decision::UseExisting(matching.clone())
        );
        records.reverse();
        assert_eq!(
            decide(&desired, &records, DEFAULT_ENVIRONMENT_NAME),
            Decision::UseExisting(matching)
        );
    }

    #[rstest]
    fn exact_match_wins_over_fixed_name(desired: VpcConfig) {
        let named = env("env-named", Some(DEFAULT_ENVIRONMENT_NAME), Some(other_vpc(1)));
        let matching = env("env-match", None, Some(desired.clone()));
        let records = vec![named, matching.clone()];

        assert_eq!(
            decide(&desired, &records, DEFAULT_ENVIRONMENT_NAME),
            Decision::UseExisting(matching)
        );
    }

    #[rstest]
    fn first_exact_match_breaks_ties(desired: VpcConfig) {
        let first = env("env-1", None, Some(desired.clone()));
        let second = env("env-2", None, Some(desired.clone()));
        assert_eq!(
            decide(&desired, &[first.clone(), second], DEFAULT_ENVIRONMENT_NAME),
            Decision::UseExisting(first)
        );
    }

    #[rstest]
    fn fixed_name_with_other_config_is_recreated(desired: VpcConfig) {
        let named = env("env-named", Some(DEFAULT_ENVIRONMENT_NAME), Some(other_vpc(1)));
        let records = vec![
            env("env-a", None, Some(other_vpc(2))),
            named.clone(),
            env("env-b", None, Some(other_vpc(3))),
        ];

        let decision = decide(&desired, &records, DEFAULT_ENVIRONMENT_NAME);
        let Decision::RecreateThenUse(target) = decision else {
            panic!("expected recreate, got {decision:?}");
        };
        assert_eq!(target.environment_id, "env-named");
    }

    #[rstest]
    fn fixed_name_without_vpc_is_ignored(desired: VpcConfig) {
        let records = vec![env("env-named", Some(DEFAULT_ENVIRONMENT_NAME), None)];
        assert_eq!(
            decide(&desired, &records, DEFAULT_ENVIRONMENT_NAME),
            Decision::CreateNew
        );
    }

    #[rstest]
    #[case(2)]
    #[case(3)]
    fn too_many_unrelated_vpc_environments_abort(desired: VpcConfig, #[case] count: u8) {
        let records: Vec<_> = (0..count)
            .map(|n| env(&format!("env-{n}"), None, Some(other_vpc(n))))
            .collect();

        assert_eq!(
            decide(&desired, &records, DEFAULT_ENVIRONMENT_NAME),
            Decision::Abort {
                configured: usize::from(count)
            }
        );
    }

    #[rstest]
    fn single_unrelated_vpc_environment_leaves_room(desired: VpcConfig) {
        let records = vec![
            env("env-0", None, Some(other_vpc(0))),
            env("env-1", Some("public"), None),
            env("env-2", None, None),
        ];
        assert_eq!(
            decide(&desired, &records, DEFAULT_ENVIRONMENT_NAME),
            Decision::CreateNew
        );
    }

    #[rstest]
    fn fixed_name_is_recreated_even_when_slots_are_full(desired: VpcConfig) {
        let named = env("env-named", Some(DEFAULT_ENVIRONMENT_NAME), Some(other_vpc(9)));
        let records = vec![
            env("env-0", None, Some(other_vpc(0))),
            env("env-1", None, Some(other_vpc(1))),
            named.clone(),
        ];
        assert_eq!(
            decide(&desired, &records, DEFAULT_ENVIRONMENT_NAME),
            Decision::RecreateThenUse(named)
        );
    }

    #[rstest]
    fn custom_fixed_name_is_honoured(desired: VpcConfig) {
        let named = env("env-named", Some("my-shell"), Some(other_vpc(1)));
        let default_named = env("env-default", Some(DEFAULT_ENVIRONMENT_NAME), Some(other_vpc(2)));
        let records = vec![default_named, named.clone()];
        assert_eq!(
            decide(&desired, &records, "my-shell"),
            Decision::RecreateThenUse(named)
        );
    }
}
