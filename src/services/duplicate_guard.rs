// src/services/duplicate_guard.rs

use crate::{
    common::error::AppError,
    db::store::DeliveryStore,
    models::drops::ExistingDrop,
};

/// Como o insert deve ser feito depois da checagem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// Ocupa a sequência 0 do endereço. Uma corrida perdida vira conflito no índice.
    Guarded,
    /// Override explícito ou endereço vazio: entra na próxima sequência livre.
    Unguarded,
}

/// Checagem antes do insert. Comparação exata, com maiúsculas, incluindo cancelados.
pub async fn check_address(
    store: &dyn DeliveryStore,
    address: &str,
    allow_duplicate: bool,
) -> Result<InsertMode, AppError> {
    if allow_duplicate || address.is_empty() {
        return Ok(InsertMode::Unguarded);
    }

    match store.find_drop_by_address(address).await? {
        Some(existing) => {
            tracing::info!("Endereço duplicado recusado: drop {} já existe", existing.id);
            Err(AppError::DuplicateAddress(ExistingDrop::from(&existing)))
        }
        None => Ok(InsertMode::Guarded),
    }
}

/// Converte a violação do índice único (corrida perdida) no mesmo 409 da checagem.
pub async fn resolve_race(store: &dyn DeliveryStore, address: &str, err: AppError) -> AppError {
    let AppError::UniqueConstraintViolation(_) = err else {
        return err;
    };

    match store.find_drop_by_address(address).await {
        Ok(Some(existing)) => {
            tracing::warn!("Corrida no endereço resolvida como duplicata do drop {}", existing.id);
            AppError::DuplicateAddress(ExistingDrop::from(&existing))
        }
        Ok(None) => err,
        Err(lookup_err) => lookup_err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory_store::MemoryStore, models::drops::NewBoxDrop};

    fn at(address: &str) -> NewBoxDrop {
        NewBoxDrop {
            homeowner_address: address.to_string(),
            ..NewBoxDrop::default()
        }
    }

    #[tokio::test]
    async fn empty_address_and_override_skip_the_lookup() {
        let store = MemoryStore::new();
        store.insert_drop(at("12 Elm St"), true).await.unwrap();

        assert_eq!(check_address(&store, "", false).await.unwrap(), InsertMode::Unguarded);
        assert_eq!(check_address(&store, "12 Elm St", true).await.unwrap(), InsertMode::Unguarded);
    }

    #[tokio::test]
    async fn match_is_exact_and_case_sensitive() {
        let store = MemoryStore::new();
        let existing = store.insert_drop(at("12 Elm St"), true).await.unwrap();

        match check_address(&store, "12 Elm St", false).await {
            Err(AppError::DuplicateAddress(found)) => assert_eq!(found.id, existing.id),
            other => panic!("esperava duplicata, veio {other:?}"),
        }
        assert_eq!(check_address(&store, "12 ELM ST", false).await.unwrap(), InsertMode::Guarded);
    }

    #[tokio::test]
    async fn cancelled_records_still_block() {
        let store = MemoryStore::new();
        let existing = store.insert_drop(at("9 Pine Rd"), true).await.unwrap();
        store
            .edit_drop(existing.id, |d| d.status = crate::models::drops::DropStatus::Cancelled)
            .await;

        assert!(matches!(
            check_address(&store, "9 Pine Rd", false).await,
            Err(AppError::DuplicateAddress(_))
        ));
    }

    #[tokio::test]
    async fn other_errors_pass_through_race_resolution() {
        let store = MemoryStore::new();
        let err = resolve_race(&store, "x", AppError::NotFound("drop")).await;
        assert!(matches!(err, AppError::NotFound("drop")));
    }
}
