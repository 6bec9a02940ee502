//! Activity history for the connected account.

use securex_store::{ActivityEntry, ActivityKind, ActivityStatus, Document, Provenance};

use crate::contract;
use crate::error::Result;
use crate::state::{AppState, Backend};

/// Entries concerning the connected account, newest first.
///
/// The contract keeps no access history, so in contract mode only uploads,
/// derived from the account's documents, are reported.
pub async fn list_activity(state: &AppState) -> Result<Vec<ActivityEntry>> {
    let route = state.route()?;
    let mut entries = match route.backend {
        Backend::Local => state.store.activity().list_for_user(route.owner.as_str()),
        Backend::Contract(client) => contract::fetch_user_documents(client, &route.owner)
            .await?
            .iter()
            .map(upload_entry)
            .collect(),
    };
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(entries)
}

pub async fn list_activity_by_kind(
    state: &AppState,
    kind: ActivityKind,
) -> Result<Vec<ActivityEntry>> {
    Ok(list_activity(state)
        .await?
        .into_iter()
        .filter(|e| e.kind == kind)
        .collect())
}

fn upload_entry(doc: &Document) -> ActivityEntry {
    ActivityEntry {
        id: format!("{}-{}", ActivityKind::Upload, doc.id),
        kind: ActivityKind::Upload,
        action: ActivityKind::Upload.action().to_string(),
        file_name: doc.file_name.clone(),
        content_hash: doc.content_hash.clone(),
        user: doc.uploader.clone(),
        timestamp: doc.upload_date,
        block_number: doc.chain.block_number,
        transaction_hash: doc.chain.transaction_hash.clone(),
        gas_used: doc.chain.gas_used,
        status: ActivityStatus::Confirmed,
        provenance: Provenance::OnChain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::documents::{upload_document, view_document};
    use crate::error::ClientError;
    use crate::state::test_support::*;
    use securex_store::NewDocument;

    #[tokio::test]
    async fn demo_activity_is_per_user() {
        let state = connected(demo_state()).await;
        let doc = upload_document(&state, "a.pdf", b"aaa").await.unwrap();
        view_document(&state, &doc.id).await.unwrap();
        state
            .store
            .create(NewDocument::new("b.pdf", "Qmb", 1, "0xsomeoneelse"))
            .unwrap();

        let entries = list_activity(&state).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.user.matches(ALICE)));
        assert_eq!(entries[0].kind, ActivityKind::View);

        let views = list_activity_by_kind(&state, ActivityKind::View).await.unwrap();
        assert_eq!(views.len(), 1);
    }

    #[tokio::test]
    async fn contract_activity_is_derived_from_uploads() {
        let (state, _contract) = contract_state();
        let state = connected(state).await;
        upload_document(&state, "one.pdf", b"1").await.unwrap();
        upload_document(&state, "two.pdf", b"2").await.unwrap();

        let entries = list_activity(&state).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["two.pdf", "one.pdf"]);
        assert!(entries.iter().all(|e| e.kind == ActivityKind::Upload));
        assert!(entries.iter().all(|e| e.provenance == Provenance::OnChain));
        assert_eq!(entries[1].id, "upload-1");
    }

    #[tokio::test]
    async fn activity_requires_connection() {
        let state = demo_state();
        assert!(matches!(list_activity(&state).await, Err(ClientError::NotConnected)));
    }
}
