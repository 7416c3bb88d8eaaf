//! # End-to-end lifecycle delivery
//!
//! A committed lifecycle change in rv-01 reaches connected observers through
//! the shared bus and the rv-02 fan-out; a refused change reaches nobody.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{assert_silent, new_submission, next_frame, principal, Pipeline};
    use rv_01_submissions::{Action, LifecycleError, SubmissionLifecycleApi, TransitionInput};
    use rv_02_realtime::{wire, ConnectionRegistry};
    use shared_bus::EventPublisher;
    use shared_types::{Role, SubmissionId, SubmissionStatus};
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_create_then_approve_reaches_submitter_and_local_verifier() {
        let pipeline = Pipeline::start();
        let contributor = principal("contributor-1", Role::Contributor, "GH");
        let verifier = principal("verifier-gh", Role::Verifier, "GH");

        let mut contributor_conn = pipeline.connect(&contributor);
        let mut verifier_conn = pipeline.connect(&verifier);

        let created = pipeline
            .lifecycle
            .create_submission(new_submission("GH", "Accra budget report"), &contributor)
            .await
            .unwrap();

        let frame = next_frame(&mut verifier_conn.receiver).await;
        assert_eq!(frame["event"], wire::SUBMISSION_CREATED);
        assert_eq!(frame["data"]["submission"]["id"], created.id.to_string());
        assert_silent(&mut contributor_conn.receiver).await;

        let approved = pipeline
            .lifecycle
            .transition(
                &created.id,
                Action::Approve,
                &verifier,
                TransitionInput::with_notes("Cross-checked with the ministry"),
            )
            .await
            .unwrap();
        assert_eq!(approved.status, SubmissionStatus::Approved);

        for receiver in [&mut contributor_conn.receiver, &mut verifier_conn.receiver] {
            let frame = next_frame(receiver).await;
            assert_eq!(frame["event"], wire::SUBMISSION_VERIFIED);
            assert_eq!(frame["data"]["status"], "approved");
            assert_eq!(frame["data"]["from"], "pending");
            assert_eq!(frame["data"]["credibility"], "medium");
            assert_eq!(frame["data"]["notes"], "Cross-checked with the ministry");
            assert_eq!(frame["data"]["actor"]["userId"], "verifier-gh");
        }

        pipeline.stop().await;
    }

    #[tokio::test]
    async fn test_refused_transition_publishes_nothing() {
        let pipeline = Pipeline::start();
        let contributor = principal("contributor-1", Role::Contributor, "GH");
        let verifier = principal("verifier-gh", Role::Verifier, "GH");
        let admin = principal("admin-1", Role::Admin, "FR");
        let mut admin_conn = pipeline.connect(&admin);

        let created = pipeline
            .lifecycle
            .create_submission(new_submission("GH", "Tema port figures"), &contributor)
            .await
            .unwrap();
        pipeline
            .lifecycle
            .transition(&created.id, Action::Reject, &verifier, TransitionInput::default())
            .await
            .unwrap();

        assert_eq!(next_frame(&mut admin_conn.receiver).await["event"], wire::SUBMISSION_CREATED);
        assert_eq!(next_frame(&mut admin_conn.receiver).await["event"], wire::SUBMISSION_VERIFIED);
        let published = pipeline.bus.events_published();

        let err = pipeline
            .lifecycle
            .transition(&created.id, Action::Approve, &admin, TransitionInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadyFinalized { .. }));

        assert_eq!(pipeline.bus.events_published(), published);
        assert_silent(&mut admin_conn.receiver).await;

        let stored = pipeline.lifecycle.get_submission(&created.id).await.unwrap();
        assert_eq!(stored.status, SubmissionStatus::Rejected);

        pipeline.stop().await;
    }

    #[tokio::test]
    async fn test_batch_delivers_one_event_per_committed_item() {
        let pipeline = Pipeline::start();
        let contributor = principal("contributor-1", Role::Contributor, "GH");
        let verifier = principal("verifier-gh", Role::Verifier, "GH");
        let mut contributor_conn = pipeline.connect(&contributor);

        let mut ids = Vec::new();
        for title in ["First", "Second", "Third"] {
            let created = pipeline
                .lifecycle
                .create_submission(new_submission("GH", title), &contributor)
                .await
                .unwrap();
            ids.push(created.id.to_string());
        }
        // One already final: the batch reports it and moves on.
        pipeline
            .lifecycle
            .transition(
                &ids[1].parse::<SubmissionId>().unwrap(),
                Action::Reject,
                &verifier,
                TransitionInput::default(),
            )
            .await
            .unwrap();
        let frame = next_frame(&mut contributor_conn.receiver).await;
        assert_eq!(frame["data"]["status"], "rejected");

        let outcomes = pipeline
            .lifecycle
            .batch_transition(&ids, Action::Approve, &verifier)
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            outcomes.iter().map(|o| o.is_ok()).collect::<Vec<_>>(),
            vec![true, false, true]
        );

        for _ in 0..2 {
            let frame = next_frame(&mut contributor_conn.receiver).await;
            assert_eq!(frame["event"], wire::SUBMISSION_VERIFIED);
        }
        assert_silent(&mut contributor_conn.receiver).await;

        pipeline.stop().await;
    }

    #[tokio::test]
    async fn test_force_disconnect_closes_queue_and_stops_delivery() {
        let pipeline = Pipeline::start();
        let verifier = principal("verifier-gh", Role::Verifier, "GH");
        let contributor = principal("contributor-1", Role::Contributor, "GH");

        let mut first = pipeline.connect(&verifier);
        let mut second = pipeline.connect(&verifier);
        assert_eq!(pipeline.registry.connections_for_user(&verifier.user_id).len(), 2);

        assert_eq!(pipeline.registry.force_disconnect_user(&verifier.user_id), 2);
        for admission in [&mut first, &mut second] {
            let closed = timeout(Duration::from_secs(1), admission.receiver.recv())
                .await
                .unwrap();
            assert!(closed.is_none());
        }
        assert_eq!(pipeline.registry.connection_count(), 0);

        pipeline
            .lifecycle
            .create_submission(new_submission("GH", "After disconnect"), &contributor)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(pipeline.fanout.stats().snapshot().deliveries, 0);

        pipeline.stop().await;
    }
}
