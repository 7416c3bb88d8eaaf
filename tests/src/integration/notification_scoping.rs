//! # Notification scoping
//!
//! Who hears about what. Five observers stay connected for the whole
//! scenario; after each lifecycle step every queue is checked for exactly
//! the frames it should hold.
//!
//! | Observer | Channels |
//! |---|---|
//! | contributor-1 (GH) | `user:contributor-1`, `role:contributor` |
//! | contributor-2 (GH) | `user:contributor-2`, `role:contributor` |
//! | verifier-gh | `user:..`, `role:verifier`, `country:GH` |
//! | verifier-fr | `user:..`, `role:verifier`, `country:FR` |
//! | admin-1 (FR) | `user:..`, `role:admin`, `country:FR` |

#[cfg(test)]
mod tests {
    use super::super::fixtures::{assert_silent, new_submission, next_frame, principal, Pipeline};
    use chrono::Utc;
    use rv_01_submissions::{Action, SubmissionLifecycleApi, TransitionInput};
    use rv_02_realtime::{wire, Admission};
    use shared_bus::{DomainEvent, EventPublisher, NoticeLevel, SystemNotice};
    use shared_types::{Role, UserId};

    fn notice(message: &str) -> DomainEvent {
        DomainEvent::SystemNotice(SystemNotice {
            message: message.to_string(),
            level: NoticeLevel::Warning,
            issued_by: UserId::new("admin-1").unwrap(),
            issued_at: Utc::now(),
        })
    }

    struct Observers {
        submitter: Admission,
        bystander: Admission,
        verifier_gh: Admission,
        verifier_fr: Admission,
        admin: Admission,
    }

    async fn expect(admission: &mut Admission, event: &str) {
        let frame = next_frame(&mut admission.receiver).await;
        assert_eq!(frame["event"], event, "connection {}", admission.info.id);
    }

    #[tokio::test]
    async fn test_each_event_reaches_exactly_its_channels() {
        let pipeline = Pipeline::start();
        let contributor = principal("contributor-1", Role::Contributor, "GH");
        let verifier_gh = principal("verifier-gh", Role::Verifier, "GH");
        let admin = principal("admin-1", Role::Admin, "FR");

        let mut o = Observers {
            submitter: pipeline.connect(&contributor),
            bystander: pipeline.connect(&principal("contributor-2", Role::Contributor, "GH")),
            verifier_gh: pipeline.connect(&verifier_gh),
            verifier_fr: pipeline.connect(&principal("verifier-fr", Role::Verifier, "FR")),
            admin: pipeline.connect(&admin),
        };

        // Created: every verifier and admin, never contributors.
        let created = pipeline
            .lifecycle
            .create_submission(new_submission("GH", "Kumasi election tally"), &contributor)
            .await
            .unwrap();
        expect(&mut o.verifier_gh, wire::SUBMISSION_CREATED).await;
        expect(&mut o.verifier_fr, wire::SUBMISSION_CREATED).await;
        expect(&mut o.admin, wire::SUBMISSION_CREATED).await;

        // Verified: submitter, local verifiers, admins.
        pipeline
            .lifecycle
            .transition(&created.id, Action::Approve, &verifier_gh, TransitionInput::default())
            .await
            .unwrap();
        expect(&mut o.submitter, wire::SUBMISSION_VERIFIED).await;
        expect(&mut o.verifier_gh, wire::SUBMISSION_VERIFIED).await;
        expect(&mut o.admin, wire::SUBMISSION_VERIFIED).await;

        // Notes edit: local verifiers and admins only.
        pipeline
            .lifecycle
            .transition(
                &created.id,
                Action::UpdateNotes,
                &verifier_gh,
                TransitionInput::with_notes("Tally confirmed by the electoral commission"),
            )
            .await
            .unwrap();
        expect(&mut o.verifier_gh, wire::SUBMISSION_UPDATED).await;
        expect(&mut o.admin, wire::SUBMISSION_UPDATED).await;

        // Tombstone: local verifiers and admins only.
        pipeline
            .lifecycle
            .delete_submission(&created.id, &admin)
            .await
            .unwrap();
        expect(&mut o.verifier_gh, wire::SUBMISSION_DELETED).await;
        expect(&mut o.admin, wire::SUBMISSION_DELETED).await;

        for admission in [
            &mut o.submitter,
            &mut o.bystander,
            &mut o.verifier_gh,
            &mut o.verifier_fr,
            &mut o.admin,
        ] {
            assert_silent(&mut admission.receiver).await;
        }

        // Operator notice: everyone.
        pipeline.bus.publish(notice("Maintenance at 22:00 UTC")).await;
        for admission in [
            &mut o.submitter,
            &mut o.bystander,
            &mut o.verifier_gh,
            &mut o.verifier_fr,
            &mut o.admin,
        ] {
            let frame = next_frame(&mut admission.receiver).await;
            assert_eq!(frame["event"], wire::SYSTEM_NOTIFICATION);
            assert_eq!(frame["data"]["message"], "Maintenance at 22:00 UTC");
        }

        pipeline.stop().await;
    }

    #[tokio::test]
    async fn test_admin_in_submission_country_gets_one_frame() {
        let pipeline = Pipeline::start();
        let contributor = principal("contributor-1", Role::Contributor, "GH");
        // Member of both role:admin and country:GH.
        let mut admin = pipeline.connect(&principal("admin-gh", Role::Admin, "GH"));

        pipeline
            .lifecycle
            .create_submission(new_submission("GH", "Cedi exchange rate"), &contributor)
            .await
            .unwrap();

        expect(&mut admin, wire::SUBMISSION_CREATED).await;
        assert_silent(&mut admin.receiver).await;

        pipeline.stop().await;
    }
}
