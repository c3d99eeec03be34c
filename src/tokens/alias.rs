//! `{token.name}` alias resolution across a flat token map.

use serde_json::Value;

use crate::error::TinctureError;
use crate::support::{refs, suggest};
use crate::tokens::TokenMap;
use crate::warnings::{TinctureWarning, ValidationMode, WarningSink};

/// Resolve every pure-alias token in the map to its terminal value.
///
/// Chains are followed until a non-alias value is reached; cycles and
/// chain lengths exceeding the map size are hard errors. On success the
/// alias token receives the terminal `$value`, fills a missing `$type`
/// from the target, and is marked with the internal alias flag while
/// `original_value` keeps the `{…}` string.
pub fn resolve_aliases(map: &mut TokenMap, sink: &mut WarningSink) -> Result<(), TinctureError> {
    let names: Vec<String> = map.names().iter().map(|n| (*n).to_string()).collect();

    for name in &names {
        let Some(token) = map.get(name) else { continue };
        let Some(first_target) = refs::alias_target(&token.value) else {
            continue;
        };
        let declared_type = token.token_type.clone();

        let mut chain = vec![name.clone()];
        let mut target = first_target.to_string();
        let terminal: Option<(Value, Option<String>)> = loop {
            if chain.iter().any(|visited| visited == &target) {
                chain.push(target);
                return Err(TinctureError::CircularReference {
                    chain: chain.join(" -> "),
                });
            }
            if chain.len() > map.len() {
                return Err(TinctureError::CircularReference {
                    chain: chain.join(" -> "),
                });
            }

            let Some(resolved) = map.get(&target) else {
                if sink.mode() == ValidationMode::Error {
                    let candidates = map.names();
                    return Err(TinctureError::TokenReference {
                        token: name.clone(),
                        target: target.clone(),
                        suggestions: suggest::did_you_mean(&target, candidates),
                    });
                }
                sink.report(TinctureWarning::InvalidToken {
                    message: format!("'{name}' references unknown token '{target}'"),
                })?;
                break None;
            };

            match refs::alias_target(&resolved.value) {
                Some(next) => {
                    let next = next.to_string();
                    chain.push(std::mem::replace(&mut target, next));
                }
                None => break Some((resolved.value.clone(), resolved.token_type.clone())),
            }
        };

        let Some((terminal_value, terminal_type)) = terminal else {
            continue;
        };

        if let (Some(declared), Some(resolved)) = (&declared_type, &terminal_type) {
            if declared != resolved {
                sink.report(TinctureWarning::AliasTypeMismatch {
                    token: name.clone(),
                    declared: declared.clone(),
                    resolved: resolved.clone(),
                })?;
            }
        }

        let Some(token) = map.get_mut(name) else { continue };
        token.value = terminal_value;
        token.is_alias = true;
        if token.token_type.is_none() {
            token.token_type = terminal_type;
        }
    }
    Ok(())
}
