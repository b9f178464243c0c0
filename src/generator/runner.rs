//! Instance generation.

use super::config::{GeneratorConfig, MatchingProblem};
use super::shared::{
    create_quotas, invert_lists, sample_agent_lists, spread_owners, with_ties,
};
use crate::error::GeneratorError;
use crate::io::write_instance;
use crate::model::{Instance, InstanceBuilder, PreferenceList};
use crate::options::InstanceOptions;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// One generated instance with its textual form.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedInstance {
    pub instance: Instance,
    /// Options under which `text` reads back into `instance`.
    pub options: InstanceOptions,
    /// Instance text followed by a blank line and the generation parameters.
    pub text: String,
}

/// Generates random instances.
///
/// # Examples
///
/// ```
/// use u_matching::generator::{GeneratorConfig, InstanceGenerator, MatchingProblem};
///
/// let config = GeneratorConfig::new(MatchingProblem::Hr, 8)
///     .with_resources(3)
///     .with_list_lengths(1, 3)
///     .with_two_sided(true)
///     .with_resource_upper_sum(8)
///     .with_seed(42);
/// let generated = InstanceGenerator::generate(&config).unwrap();
/// assert_eq!(generated.instance.num_agents(), 8);
/// assert!(generated.text.starts_with("8 3\n"));
/// ```
pub struct InstanceGenerator;

impl InstanceGenerator {
    /// Generates one instance, seeded from the config when it has a seed.
    pub fn generate(config: &GeneratorConfig) -> Result<GeneratedInstance, GeneratorError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or_else(rand::random));
        Self::generate_with(config, &mut rng)
    }

    /// Generates `count` instances. Instance `i` uses seed `seed + i`.
    pub fn generate_batch(
        config: &GeneratorConfig,
        count: usize,
    ) -> Result<Vec<GeneratedInstance>, GeneratorError> {
        config.validate()?;
        let base = config.seed.unwrap_or_else(rand::random);
        let one = |i: usize| {
            let mut rng = StdRng::seed_from_u64(base.wrapping_add(i as u64));
            Self::generate_with(config, &mut rng)
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            (0..count).into_par_iter().map(one).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            (0..count).map(one).collect()
        }
    }

    /// Generates one instance from an explicit random source. The config is
    /// expected to be validated already.
    pub fn generate_with<R: Rng>(
        config: &GeneratorConfig,
        rng: &mut R,
    ) -> Result<GeneratedInstance, GeneratorError> {
        let n1 = config.num_agents;
        let n2 = config.resources();
        let raw = sample_agent_lists(
            n1,
            n2,
            (config.min_list_len, config.max_list_len),
            config.skew,
            rng,
        )?;
        let agent_lists = with_ties(&raw, config.agent_ties, rng);
        let supervisor_ties = config.supervisor_ties.unwrap_or(0.0);

        let (lower_sum, upper_sum) = config.resource_sums();
        let lower = create_quotas(n2, lower_sum);
        let upper = create_quotas(n2, upper_sum);

        let mut builder = InstanceBuilder::new().two_sided(config.two_sided);
        for list in agent_lists {
            builder.add_agent(list);
        }

        match config.problem {
            MatchingProblem::Ha | MatchingProblem::Sm | MatchingProblem::Hr => {
                let resource_lists: Vec<Option<PreferenceList>> = if config.two_sided {
                    let inverted = invert_lists(&raw, n2, rng);
                    with_ties(&inverted, supervisor_ties, rng)
                        .into_iter()
                        .map(Some)
                        .collect()
                } else {
                    vec![None; n2]
                };
                for (j, list) in resource_lists.into_iter().enumerate() {
                    builder.add_self_supervised(lower[j], upper[j], list);
                }
            }
            MatchingProblem::Spa => {
                let n3 = config.supervisors();
                let owners = spread_owners(n2, n3);
                let (s_lower, s_target, s_upper) = config.supervisor_sums();
                let s_lower = create_quotas(n3, s_lower);
                let s_target = create_quotas(n3, s_target);
                let s_upper = create_quotas(n3, s_upper);
                for k in 0..n3 {
                    builder.add_supervisor(s_lower[k], s_target[k], s_upper[k]);
                }
                for (j, &owner) in owners.iter().enumerate() {
                    builder.add_resource(lower[j], upper[j], owner);
                }
                if config.two_sided {
                    // Agent lists over supervisors, each supervisor once.
                    let by_supervisor: Vec<Vec<usize>> = raw
                        .iter()
                        .map(|list| {
                            let mut ranked: Vec<usize> =
                                list.iter().map(|&j| owners[j - 1]).collect();
                            ranked.sort_unstable();
                            ranked.dedup();
                            ranked
                        })
                        .collect();
                    let inverted = invert_lists(&by_supervisor, n3, rng);
                    for (k, list) in with_ties(&inverted, supervisor_ties, rng)
                        .into_iter()
                        .enumerate()
                    {
                        builder.set_supervisor_preferences(k + 1, list);
                    }
                }
            }
        }

        let instance = builder.build()?;
        let options = InstanceOptions::new(config.problem.agent_classes())
            .with_two_sided(config.two_sided);
        let text = format!(
            "{}\n{}",
            write_instance(&instance, &options),
            parameters_text(config)
        );
        debug!(
            problem = %config.problem,
            agents = instance.num_agents(),
            pairs = instance.pairs().len(),
            "instance generated"
        );
        Ok(GeneratedInstance {
            instance,
            options,
            text,
        })
    }
}

/// Trailing block describing the generation parameters.
fn parameters_text(config: &GeneratorConfig) -> String {
    let (lower_sum, upper_sum) = config.resource_sums();
    let mut lines = vec![
        "instance generation parameters".to_string(),
        format!("problem: {}", config.problem),
        format!("number_of_agents_type_1: {}", config.num_agents),
        format!("number_of_agents_type_2: {}", config.resources()),
    ];
    if config.problem == MatchingProblem::Spa {
        lines.push(format!("number_of_agents_type_3: {}", config.supervisors()));
    }
    lines.extend([
        format!("min_pref_list_length: {}", config.min_list_len),
        format!("max_pref_list_length: {}", config.max_list_len),
        format!("ties_probability_1: {}", config.agent_ties),
        format!("ties_probability_2: {}", config.supervisor_ties.unwrap_or(0.0)),
        format!("sum_agent2_lower_quotas: {lower_sum}"),
        format!("sum_agent2_upper_quotas: {upper_sum}"),
        format!("skew_for_agent_1: {}", config.skew),
    ]);
    if config.problem == MatchingProblem::Spa {
        let (lower, target, upper) = config.supervisor_sums();
        lines.extend([
            format!("sum_agent3_lower_quotas: {lower}"),
            format!("sum_agent3_targets: {target}"),
            format!("sum_agent3_upper_quotas: {upper}"),
        ]);
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_instance;
    use crate::predicate::is_valid;

    fn spa() -> GeneratorConfig {
        GeneratorConfig::new(MatchingProblem::Spa, 12)
            .with_resources(5)
            .with_supervisors(2)
            .with_list_lengths(2, 4)
            .with_two_sided(true)
            .with_skew(3.0)
            .with_agent_ties(0.3)
            .with_supervisor_ties(0.2)
            .with_resource_upper_sum(15)
            .with_supervisor_lower_sum(1)
            .with_supervisor_target_sum(5)
            .with_supervisor_upper_sum(12)
            .with_seed(2024)
    }

    #[test]
    fn test_spa_shape() {
        let generated = InstanceGenerator::generate(&spa()).unwrap();
        let instance = &generated.instance;
        assert_eq!(instance.num_agents(), 12);
        assert_eq!(instance.num_resources(), 5);
        assert_eq!(instance.num_supervisors(), 2);
        assert!(instance.is_two_sided());
        assert_eq!(instance.supervisors()[0].resources, vec![0, 1, 2]);
        assert_eq!(instance.supervisors()[1].resources, vec![3, 4]);
        let uppers: Vec<_> = instance.resources().iter().map(|r| r.upper).collect();
        assert_eq!(uppers, vec![3, 3, 3, 3, 3]);
        let quotas: Vec<_> = instance
            .supervisors()
            .iter()
            .map(|s| (s.lower, s.target, s.upper))
            .collect();
        assert_eq!(quotas, vec![(1, 3, 6), (0, 2, 6)]);
        for agent in 0..12 {
            assert!((2..=4).contains(&instance.agent_pairs(agent).len()));
        }
        assert!(instance.pairs().iter().all(|p| p.supervisor_rank.is_some()));
    }

    #[test]
    fn test_text_reads_back() {
        for config in [
            spa(),
            spa().with_two_sided(false).with_supervisor_ties(0.0),
            GeneratorConfig::new(MatchingProblem::Sm, 5)
                .with_list_lengths(1, 5)
                .with_two_sided(true)
                .with_agent_ties(0.5)
                .with_seed(5),
        ] {
            let generated = InstanceGenerator::generate(&config).unwrap();
            let parsed = parse_instance(&generated.text, &generated.options).unwrap();
            assert_eq!(parsed, generated.instance);
        }
    }

    #[test]
    fn test_seed_reproduces_instance() {
        let a = InstanceGenerator::generate(&spa()).unwrap();
        let b = InstanceGenerator::generate(&spa()).unwrap();
        assert_eq!(a.text, b.text);
    }

    #[test]
    fn test_parameters_block() {
        let text = InstanceGenerator::generate(&spa()).unwrap().text;
        assert!(text.contains("\n\ninstance generation parameters\nproblem: SPA\n"));
        assert!(text.contains("number_of_agents_type_3: 2\n"));
        assert!(text.ends_with("sum_agent3_upper_quotas: 12\n"));
    }

    #[test]
    fn test_ha_is_one_sided_and_empty_matching_fits() {
        let config = GeneratorConfig::new(MatchingProblem::Ha, 6)
            .with_resources(3)
            .with_list_lengths(1, 2)
            .with_resource_upper_sum(3)
            .with_seed(11);
        let generated = InstanceGenerator::generate(&config).unwrap();
        assert!(!generated.instance.is_two_sided());
        assert!(generated.text.starts_with("6 3\n"));
        assert!(is_valid(&generated.instance, &[], false));
    }

    #[test]
    fn test_batch() {
        let batch = InstanceGenerator::generate_batch(&spa(), 4).unwrap();
        assert_eq!(batch.len(), 4);
        let single = InstanceGenerator::generate(&spa()).unwrap();
        assert_eq!(batch[0].text, single.text);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = spa().with_list_lengths(2, 6);
        assert!(matches!(
            InstanceGenerator::generate(&config),
            Err(GeneratorError::Bounds(_))
        ));
    }
}
