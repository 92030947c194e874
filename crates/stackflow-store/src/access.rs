//! Credential lookup rules shared by every store

use crate::error::{Result, StoreError};
use stackflow_core::{Credential, CredentialMeta, Principal};
use std::collections::BTreeMap;

/// Pick the requested credentials in request order.
///
/// Unknown identifiers are skipped, repeated ones returned once. Any
/// credential the principal may not use fails the lookup.
pub(crate) fn select(
    credentials: &BTreeMap<String, Credential>,
    identifiers: &[String],
    principal: &Principal,
) -> Result<Vec<Credential>> {
    let mut selected: Vec<Credential> = Vec::with_capacity(identifiers.len());

    for identifier in identifiers {
        if selected.iter().any(|c| c.identifier == *identifier) {
            continue;
        }
        let Some(cred) = credentials.get(identifier) else {
            continue;
        };
        if !cred.is_accessible_by(principal) {
            return Err(StoreError::PermissionDenied {
                identifier: identifier.clone(),
                username: principal.username.clone(),
            });
        }
        selected.push(cred.clone());
    }

    Ok(selected)
}

/// Replace the metadata of existing credentials.
///
/// Nothing is written unless every identifier exists.
pub(crate) fn update_metas(
    credentials: &mut BTreeMap<String, Credential>,
    metas: BTreeMap<String, CredentialMeta>,
) -> Result<()> {
    if let Some(missing) = metas.keys().find(|id| !credentials.contains_key(*id)) {
        return Err(StoreError::CredentialNotFound(missing.clone()));
    }

    for (identifier, meta) in metas {
        if let Some(cred) = credentials.get_mut(&identifier) {
            cred.meta = meta;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackflow_core::Provider;

    fn credentials() -> BTreeMap<String, Credential> {
        [
            Credential::new("cred-1", "alice", CredentialMeta::empty(Provider::Aws)),
            Credential::new("cred-2", "bob", CredentialMeta::empty(Provider::Aws)).share_with("g1"),
            Credential::new("cred-3", "bob", CredentialMeta::empty(Provider::Aws)),
        ]
        .into_iter()
        .map(|c| (c.identifier.clone(), c))
        .collect()
    }

    #[test]
    fn test_select_keeps_request_order() {
        let ids = vec!["cred-2".to_string(), "missing".into(), "cred-1".into(), "cred-2".into()];

        let selected = select(&credentials(), &ids, &Principal::new("alice", "g1")).unwrap();

        let names: Vec<&str> = selected.iter().map(|c| c.identifier.as_str()).collect();
        assert_eq!(names, vec!["cred-2", "cred-1"]);
    }

    #[test]
    fn test_select_rejects_foreign_credential() {
        let err = select(
            &credentials(),
            &["cred-3".to_string()],
            &Principal::new("alice", "g1"),
        )
        .unwrap_err();

        assert!(matches!(err, StoreError::PermissionDenied { ref identifier, .. } if identifier == "cred-3"));
    }

    #[test]
    fn test_update_metas_is_all_or_nothing() {
        let mut creds = credentials();
        let mut metas = BTreeMap::new();
        metas.insert("cred-1".to_string(), CredentialMeta::empty(Provider::Vagrant));
        metas.insert("nope".to_string(), CredentialMeta::empty(Provider::Vagrant));

        assert!(update_metas(&mut creds, metas).is_err());
        assert_eq!(creds["cred-1"].provider(), Provider::Aws);
    }
}
