// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `errors.rs`

#[cfg(test)]
mod tests {
    use crate::errors::IntentError;
    use crate::status_reasons::is_error_kind_reason;

    fn all_variants() -> Vec<IntentError> {
        vec![
            IntentError::Validation {
                reason: "empty function list".into(),
            },
            IntentError::Unplaceable {
                function: "upf".into(),
                reason: "no edge site".into(),
            },
            IntentError::InventoryUnavailable {
                reason: "connection refused".into(),
            },
            IntentError::Render {
                package: "slice-upf".into(),
                reason: "io error".into(),
                transient: true,
            },
            IntentError::ValidationRule {
                package: "slice-upf".into(),
                rule: "required-labels".into(),
                reason: "missing oran.io/vnf-type".into(),
            },
            IntentError::RevisionCreate {
                package: "slice-upf".into(),
                repository: "edge01-tokyo".into(),
                reason: "503".into(),
                transient: true,
            },
            IntentError::RevisionLifecycleStuck {
                revision: "slice-upf.v1".into(),
                lifecycle: "Draft".into(),
            },
            IntentError::DeploymentStatus {
                reason: "timeout".into(),
            },
            IntentError::PhaseTimeout {
                phase: "Deploying".into(),
                deadline_secs: 600,
            },
            IntentError::ConcurrencyConflict {
                intent: "default/slice-embb-001".into(),
                attempts: 3,
            },
        ]
    }

    /// Every variant surfaces a reason from the enumerated error-kind set.
    #[test]
    fn test_every_reason_is_enumerated() {
        for err in all_variants() {
            assert!(
                is_error_kind_reason(err.reason()),
                "reason {} not in enumerated set",
                err.reason()
            );
        }
    }

    #[test]
    fn test_terminal_errors_are_not_transient() {
        let validation = IntentError::Validation {
            reason: "bad".into(),
        };
        assert!(!validation.is_transient());

        let unplaceable = IntentError::Unplaceable {
            function: "gnb".into(),
            reason: "no site".into(),
        };
        assert!(!unplaceable.is_transient());

        let rule = IntentError::ValidationRule {
            package: "p".into(),
            rule: "r".into(),
            reason: "m".into(),
        };
        assert!(!rule.is_transient());

        let timeout = IntentError::PhaseTimeout {
            phase: "Deploying".into(),
            deadline_secs: 600,
        };
        assert!(!timeout.is_transient());
    }

    #[test]
    fn test_render_transience_follows_flag() {
        let io = IntentError::Render {
            package: "p".into(),
            reason: "io".into(),
            transient: true,
        };
        assert!(io.is_transient());

        let determinism = IntentError::Render {
            package: "p".into(),
            reason: "non-deterministic output".into(),
            transient: false,
        };
        assert!(!determinism.is_transient());
    }

    #[test]
    fn test_service_errors_are_transient() {
        let inventory = IntentError::InventoryUnavailable {
            reason: "dns".into(),
        };
        assert!(inventory.is_transient());

        let create = IntentError::RevisionCreate {
            package: "p".into(),
            repository: "r".into(),
            reason: "503".into(),
            transient: true,
        };
        assert!(create.is_transient());

        let missing_repo = IntentError::RevisionCreate {
            package: "p".into(),
            repository: "r".into(),
            reason: "repository 'r' does not exist".into(),
            transient: false,
        };
        assert!(!missing_repo.is_transient());

        let status = IntentError::DeploymentStatus {
            reason: "timeout".into(),
        };
        assert!(status.is_transient());
    }

    /// Messages keep the offending object in the text so conditions are
    /// actionable without log spelunking.
    #[test]
    fn test_messages_name_the_subject() {
        let err = IntentError::Unplaceable {
            function: "upf".into(),
            reason: "no edge capacity".into(),
        };
        assert!(err.to_string().contains("upf"));

        let err = IntentError::RevisionCreate {
            package: "slice-gnb".into(),
            repository: "edge01-tokyo".into(),
            reason: "503".into(),
            transient: true,
        };
        let msg = err.to_string();
        assert!(msg.contains("slice-gnb") && msg.contains("edge01-tokyo"));
    }
}
