use nom::{
    IResult,
    Parser,
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::{map, opt},
    multi::separated_list0,
    sequence::{delimited, separated_pair},
};

use super::model::{Action, Policy, PolicyError, PolicyResource, ResourceType};

const POLICY_SEPARATOR: &str = "\n\n";
const RESOURCE_ACTION_SEPARATOR: char = ';';
const VALUES_SEPARATOR: char = ',';
const RESOURCES_PREFIX: &str = "resources=";
const ACTIONS_PREFIX: &str = "actions=";

fn is_token_char(c: char) -> bool {
    !matches!(c, ',' | '{' | '}' | ':' | ';')
}

fn type_token(input: &str) -> IResult<&str, &str> {
    take_while1(is_token_char).parse(input)
}

fn label(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(take_while1(is_token_char), char(':'), take_while(is_token_char)).parse(input)
}

fn labels(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    delimited(char('{'), separated_list0(char(VALUES_SEPARATOR), label), char('}')).parse(input)
}

fn resource(input: &str) -> IResult<&str, PolicyResource> {
    map((type_token, opt(labels)), |(ty, pairs)| {
        let mut res = PolicyResource::new(ResourceType::from_text(ty));
        for (k, v) in pairs.unwrap_or_default() {
            res.insert_label(k, v);
        }
        res
    })
    .parse(input)
}

/// Empty entries (`a,,b` or a trailing comma) are skipped like empty actions.
fn resource_list(input: &str) -> IResult<&str, Vec<PolicyResource>> {
    map(separated_list0(char(VALUES_SEPARATOR), opt(resource)), |entries| {
        entries.into_iter().flatten().collect()
    })
    .parse(input)
}

fn parse_resources(value: &str) -> Option<Vec<PolicyResource>> {
    match resource_list(value) {
        Ok(("", resources)) => Some(resources),
        _ => None,
    }
}

fn parse_actions(value: &str) -> Vec<Action> {
    value
        .split(VALUES_SEPARATOR)
        .filter(|token| !token.is_empty())
        .map(Action::from_text)
        .collect()
}

/// Parse one blank-line-delimited chunk, or `None` if it does not have the
/// `resources=…;actions=…` shape.
fn parse_chunk(chunk: &str) -> Option<Policy> {
    let compact: String = chunk.chars().filter(|c| !c.is_whitespace()).collect();

    let mut parts = compact.split(RESOURCE_ACTION_SEPARATOR);
    let (Some(resources), Some(actions), None) = (parts.next(), parts.next(), parts.next()) else {
        tracing::debug!(chunk = %compact, "skipping policy: expected resources=...;actions=...");
        return None;
    };

    let (Some(resources), Some(actions)) = (
        resources.strip_prefix(RESOURCES_PREFIX),
        actions.strip_prefix(ACTIONS_PREFIX),
    ) else {
        tracing::debug!(chunk = %compact, "skipping policy: missing resources= or actions= key");
        return None;
    };

    let Some(resources) = parse_resources(resources) else {
        tracing::debug!(chunk = %compact, "skipping policy: malformed resource list");
        return None;
    };

    Some(Policy::new(resources, parse_actions(actions)))
}

/// Parse policy text into policies.
///
/// Chunks are separated by a blank line. Whitespace inside a chunk is
/// insignificant. Chunks that do not match `resources=…;actions=…` are
/// dropped, and unknown resource or action names become `Unspecified`;
/// neither case fails the call.
pub fn parse_policies(text: &str) -> Vec<Policy> {
    text.split(POLICY_SEPARATOR)
        .filter(|chunk| !chunk.is_empty())
        .filter_map(parse_chunk)
        .collect()
}

/// Render policies in their editable text form, one blank line apart.
pub fn formalize_policies(policies: &[Policy]) -> String {
    policies
        .iter()
        .map(formalize_policy)
        .collect::<Vec<_>>()
        .join(POLICY_SEPARATOR)
}

fn formalize_policy(policy: &Policy) -> String {
    let resources = policy
        .resources
        .iter()
        .map(PolicyResource::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let actions = policy
        .actions
        .iter()
        .map(Action::as_text)
        .collect::<Vec<_>>()
        .join(",");
    format!("{RESOURCES_PREFIX}{resources}{RESOURCE_ACTION_SEPARATOR}{ACTIONS_PREFIX}{actions}")
}

/// Report the first resource type or action that did not map to a known
/// value. Parsing itself never rejects these; this is an opt-in check for
/// callers about to submit policies.
pub fn validate_policies(policies: &[Policy]) -> Result<(), PolicyError> {
    for (policy, p) in policies.iter().enumerate() {
        if let Some(resource) = p.resources.iter().position(|r| !r.resource_type.is_mapped()) {
            return Err(PolicyError::UnmappedResource { policy, resource });
        }
        if let Some(action) = p.actions.iter().position(|a| !a.is_mapped()) {
            return Err(PolicyError::UnmappedAction { policy, action });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec;
    use proptest::prelude::*;
    use proptest::sample::select;

    fn resource_strategy() -> impl Strategy<Value = PolicyResource> {
        (
            select(ResourceType::MAPPED.to_vec()),
            vec(("[a-z][a-z0-9_]{0,6}", "[a-z0-9._-]{0,6}"), 0..3),
        )
            .prop_map(|(ty, labels)| {
                labels
                    .into_iter()
                    .fold(PolicyResource::new(ty), |res, (k, v)| res.with_label(k, v))
            })
    }

    fn policy_strategy() -> impl Strategy<Value = Policy> {
        (vec(resource_strategy(), 0..4), vec(select(Action::MAPPED.to_vec()), 0..4))
            .prop_map(|(resources, actions)| Policy::new(resources, actions))
    }

    #[test]
    fn parse_single_resource_and_action() {
        let policies = parse_policies("resources=APPLICATION;actions=GET");
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].resources, vec![PolicyResource::new(ResourceType::Application)]);
        assert_eq!(policies[0].actions, vec![Action::Get]);
    }

    #[test]
    fn parse_labels_and_action_order() {
        let policies = parse_policies("resources=APPLICATION{env:prod};actions=GET,DELETE");
        assert_eq!(
            policies[0].resources,
            vec![PolicyResource::new(ResourceType::Application).with_label("env", "prod")]
        );
        assert_eq!(policies[0].actions, vec![Action::Get, Action::Delete]);
    }

    #[test]
    fn parse_missing_actions_key_is_dropped() {
        assert!(parse_policies("resources=APPLICATION;foo=GET").is_empty());
        assert!(parse_policies("res=application;actions=get").is_empty());
    }

    #[test]
    fn parse_wrong_part_count_is_dropped() {
        assert!(parse_policies("resources=application").is_empty());
        assert!(parse_policies("resources=application;actions=get;actions=list").is_empty());
        assert!(parse_policies("   ").is_empty());
    }

    #[test]
    fn parse_unbalanced_labels_is_dropped() {
        assert!(parse_policies("resources=application{env:prod;actions=get").is_empty());
        assert!(parse_policies("resources=application{env};actions=get").is_empty());
    }

    #[test]
    fn parse_empty_resource_tokens_are_skipped() {
        let policies = parse_policies("resources=application,;actions=get");
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].resources, vec![PolicyResource::new(ResourceType::Application)]);
        assert_eq!(policies[0].actions, vec![Action::Get]);

        let policies = parse_policies("resources=,deployment,,event{env:dev};actions=,list,");
        let types: Vec<_> = policies[0].resources.iter().map(|r| r.resource_type).collect();
        assert_eq!(types, vec![ResourceType::Deployment, ResourceType::Event]);
        assert_eq!(policies[0].actions, vec![Action::List]);
    }

    #[test]
    fn parse_multiple_resources_with_labels() {
        let policies = parse_policies(
            "resources=application{env:prod,team:payments},deployment,piped{region:eu};actions=*",
        );
        let resources = &policies[0].resources;
        assert_eq!(resources.len(), 3);
        assert_eq!(resources[0].labels.len(), 2);
        assert_eq!(resources[1].resource_type, ResourceType::Deployment);
        assert_eq!(resources[2].labels, vec![("region".to_string(), "eu".to_string())]);
        assert_eq!(policies[0].actions, vec![Action::All]);
    }

    #[test]
    fn parse_strips_whitespace() {
        let policies = parse_policies("  resources = application { env : prod } ;\n actions = get , list ");
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].resources[0].labels[0].1, "prod");
        assert_eq!(policies[0].actions, vec![Action::Get, Action::List]);
    }

    #[test]
    fn parse_multiple_chunks_skipping_bad_ones() {
        let text = "resources=application;actions=get\n\nnot a policy\n\nresources=*;actions=*";
        let policies = parse_policies(text);
        assert_eq!(policies.len(), 2);
        assert_eq!(policies[1].resources[0].resource_type, ResourceType::All);
    }

    #[test]
    fn parse_unknown_tokens_become_unspecified() {
        let policies = parse_policies("resources=cluster,application;actions=get,patch");
        assert_eq!(policies[0].resources[0].resource_type, ResourceType::Unspecified);
        assert_eq!(policies[0].resources[1].resource_type, ResourceType::Application);
        assert_eq!(policies[0].actions, vec![Action::Get, Action::Unspecified]);
    }

    #[test]
    fn parse_empty_values() {
        let policies = parse_policies("resources=;actions=");
        assert_eq!(policies.len(), 1);
        assert!(policies[0].resources.is_empty());
        assert!(policies[0].actions.is_empty());
    }

    #[test]
    fn parse_duplicate_label_key_last_wins() {
        let policies = parse_policies("resources=event{env:dev,env:prod};actions=list");
        assert_eq!(policies[0].resources[0].labels, vec![("env".to_string(), "prod".to_string())]);
    }

    #[test]
    fn formalize_policies_text() {
        let policies = vec![
            Policy::new(
                vec![
                    PolicyResource::new(ResourceType::Application).with_label("env", "prod"),
                    PolicyResource::new(ResourceType::ApiKey),
                ],
                vec![Action::Get, Action::List],
            ),
            Policy::new(vec![PolicyResource::new(ResourceType::All)], vec![Action::All]),
        ];
        assert_eq!(
            formalize_policies(&policies),
            "resources=application{env:prod},apiKey;actions=get,list\n\nresources=*;actions=*"
        );
    }

    #[test]
    fn formalize_empty_list() {
        assert_eq!(formalize_policies(&[]), "");
    }

    #[test]
    fn round_trip_is_equivalent() {
        let original = parse_policies(
            "resources=APPLICATION{env:prod,team:a},INSIGHT;actions=GET,DELETE\n\nresources=deploymentChain;actions=list",
        );
        let reparsed = parse_policies(&formalize_policies(&original));
        assert_eq!(reparsed.len(), original.len());
        for (a, b) in original.iter().zip(&reparsed) {
            assert!(a.is_equivalent(b));
        }
    }

    #[test]
    fn validate_reports_first_unmapped_value() {
        assert_eq!(validate_policies(&parse_policies("resources=application;actions=get")), Ok(()));
        assert_eq!(
            validate_policies(&parse_policies("resources=application;actions=get,patch")),
            Err(PolicyError::UnmappedAction { policy: 0, action: 1 })
        );
        assert_eq!(
            validate_policies(&parse_policies("resources=*;actions=*\n\nresources=x;actions=get")),
            Err(PolicyError::UnmappedResource { policy: 1, resource: 0 })
        );
    }

    proptest! {
        #[test]
        fn prop_formalize_then_parse_is_equivalent(policies in vec(policy_strategy(), 0..4)) {
            let reparsed = parse_policies(&formalize_policies(&policies));
            prop_assert_eq!(reparsed.len(), policies.len());
            for (original, back) in policies.iter().zip(&reparsed) {
                prop_assert!(original.is_equivalent(back), "{:?} != {:?}", original, back);
            }
        }
    }
}
