//! Reading and writing the textual instance format.

use crate::error::ParseError;
use crate::model::{Instance, InstanceBuilder, PreferenceList};
use crate::options::{AgentClasses, InstanceOptions};
use std::fmt::Write;

/// One non-blank line split on `:` and whitespace.
struct Record<'a> {
    line: usize,
    fields: Vec<&'a str>,
}

impl<'a> Record<'a> {
    fn new(line: usize, text: &'a str) -> Self {
        Self {
            line,
            fields: text
                .split(|c: char| c == ':' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Line {
            line: self.line,
            message: message.into(),
        }
    }

    fn number(&self, index: usize, what: &str) -> Result<usize, ParseError> {
        let token = self
            .fields
            .get(index)
            .ok_or_else(|| self.error(format!("missing {what}")))?;
        token
            .parse()
            .map_err(|_| self.error(format!("invalid {what} `{token}`")))
    }

    /// Checks the leading id against the expected 1-based position.
    fn expect_id(&self, expected: usize) -> Result<(), ParseError> {
        let id = self.number(0, "id")?;
        if id != expected {
            return Err(self.error(format!("expected id {expected}, found {id}")));
        }
        Ok(())
    }

    fn preferences(&self, from: usize) -> Result<PreferenceList, ParseError> {
        let tokens = self.fields.get(from..).unwrap_or(&[]);
        PreferenceList::parse_tokens(tokens).map_err(|message| self.error(message))
    }
}

/// Sequential reader over the required lines of a section.
struct Sections<'a, I: Iterator<Item = (usize, &'a str)>> {
    lines: I,
}

impl<'a, I: Iterator<Item = (usize, &'a str)>> Sections<'a, I> {
    /// Next record of a section of `expected` lines, `index` of which were
    /// read already. A blank line or the end of input ends the data.
    fn next(
        &mut self,
        what: &'static str,
        expected: usize,
        index: usize,
    ) -> Result<Record<'a>, ParseError> {
        match self.lines.next() {
            Some((line, text)) if !text.trim().is_empty() => Ok(Record::new(line, text)),
            _ => Err(ParseError::MissingLines {
                what,
                expected,
                found: index,
            }),
        }
    }
}

/// Parses an instance from its textual form.
///
/// Supervisor (or, with two agent classes, resource) preference lists are
/// read only when `options.two_sided` is set.
///
/// # Examples
///
/// ```
/// use u_matching::io::parse_instance;
/// use u_matching::options::{AgentClasses, InstanceOptions};
///
/// let text = "2 1 1\n1: 1\n2: 1\n1: 0: 2: 1\n1: 0: 1: 2: 2 1\n";
/// let options = InstanceOptions::new(AgentClasses::Three).with_two_sided(true);
/// let instance = parse_instance(text, &options).unwrap();
///
/// assert_eq!(instance.num_agents(), 2);
/// assert_eq!(instance.pairs()[1].supervisor_rank, Some(1));
/// ```
pub fn parse_instance(text: &str, options: &InstanceOptions) -> Result<Instance, ParseError> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));
    let (header_line, header) = lines
        .by_ref()
        .find(|(_, l)| !l.trim().is_empty())
        .ok_or(ParseError::Empty)?;
    let header = Record::new(header_line, header);

    let num_agents = header.number(0, "number of agents")?;
    let num_resources = header.number(1, "number of resources")?;
    let num_supervisors = match options.agent_classes {
        AgentClasses::Two => num_resources,
        AgentClasses::Three => header.number(2, "number of supervisors")?,
    };

    let mut sections = Sections { lines };
    let mut builder = InstanceBuilder::new().two_sided(options.two_sided);

    for i in 0..num_agents {
        let record = sections.next("agents", num_agents, i)?;
        record.expect_id(i + 1)?;
        builder.add_agent(record.preferences(1)?);
    }

    for j in 0..num_resources {
        let record = sections.next("resources", num_resources, j)?;
        record.expect_id(j + 1)?;
        let lower = record.number(1, "lower quota")?;
        let upper = record.number(2, "upper quota")?;
        match options.agent_classes {
            AgentClasses::Two => {
                let preferences = if options.two_sided {
                    Some(record.preferences(3)?)
                } else {
                    None
                };
                builder.add_self_supervised(lower, upper, preferences);
            }
            AgentClasses::Three => {
                let supervisor = record.number(3, "supervisor")?;
                builder.add_resource(lower, upper, supervisor);
            }
        }
    }

    if options.agent_classes == AgentClasses::Three {
        for k in 0..num_supervisors {
            let record = sections.next("supervisors", num_supervisors, k)?;
            record.expect_id(k + 1)?;
            let id = builder.add_supervisor(
                record.number(1, "lower quota")?,
                record.number(2, "target")?,
                record.number(3, "upper quota")?,
            );
            if options.two_sided {
                builder.set_supervisor_preferences(id, record.preferences(4)?);
            }
        }
    }

    Ok(builder.build()?)
}

/// Writes an instance in the textual form read by [`parse_instance`].
///
/// With two agent classes every resource is written with its own
/// quotas and ranking; supervisors are implied.
pub fn write_instance(instance: &Instance, options: &InstanceOptions) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_into(&mut out, instance, options);
    out
}

fn write_into(out: &mut String, instance: &Instance, options: &InstanceOptions) -> std::fmt::Result {
    match options.agent_classes {
        AgentClasses::Two => writeln!(out, "{} {}", instance.num_agents(), instance.num_resources())?,
        AgentClasses::Three => writeln!(
            out,
            "{} {} {}",
            instance.num_agents(),
            instance.num_resources(),
            instance.num_supervisors()
        )?,
    }

    for agent in instance.agents() {
        writeln!(out, "{}: {}", agent.id, agent.preferences)?;
    }

    let ranking = |list: Option<&PreferenceList>| match (options.two_sided, list) {
        (true, Some(list)) => list.to_string(),
        _ => String::new(),
    };

    match options.agent_classes {
        AgentClasses::Two => {
            for resource in instance.resources() {
                let list = resource.preferences.as_ref().or_else(|| {
                    instance
                        .supervisors()
                        .get(resource.supervisor)
                        .and_then(|s| s.preferences.as_ref())
                });
                writeln!(
                    out,
                    "{}: {}: {}: {}",
                    resource.id,
                    resource.lower,
                    resource.upper,
                    ranking(list)
                )?;
            }
        }
        AgentClasses::Three => {
            for resource in instance.resources() {
                writeln!(
                    out,
                    "{}: {}: {}: {}",
                    resource.id,
                    resource.lower,
                    resource.upper,
                    resource.supervisor + 1
                )?;
            }
            for supervisor in instance.supervisors() {
                writeln!(
                    out,
                    "{}: {}: {}: {}: {}",
                    supervisor.id,
                    supervisor.lower,
                    supervisor.target,
                    supervisor.upper,
                    ranking(supervisor.preferences.as_ref())
                )?;
            }
        }
    }
    Ok(())
}
