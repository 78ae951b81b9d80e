//! Storage layer tests for buildgate.

use buildgate_core::{AccessGrant, CronInterval, State};

use super::db::Database;
use super::models::{Repository, User};
use super::queries_cron::NewCron;

async fn test_db() -> Database {
    Database::open_in_memory().await.unwrap()
}

async fn owner_and_repo(db: &Database) -> (User, Repository) {
    let owner = db.create_user(1, "svenfuchs", Some("Sven")).await.unwrap();
    let repo = db
        .create_repository(10, &owner, "minimal", false)
        .await
        .unwrap();
    (owner, repo)
}

// === Repository and grant tests ===

#[tokio::test]
async fn create_and_get_repository() {
    let db = test_db().await;
    let (owner, repo) = owner_and_repo(&db).await;

    assert_eq!(repo.owner_id, owner.id);
    assert_eq!(repo.slug(), "svenfuchs/minimal");
    assert!(!repo.private);

    assert!(db.set_repository_private(repo.id, true).await.unwrap());
    assert!(db.get_repository(repo.id).await.unwrap().private);
}

#[tokio::test]
async fn missing_repository_is_not_found() {
    let db = test_db().await;
    let err = db.get_repository(999).await.unwrap_err();
    assert!(matches!(err, super::DatabaseError::NotFound(_)));
}

#[tokio::test]
async fn grant_is_upserted() {
    let db = test_db().await;
    let (owner, repo) = owner_and_repo(&db).await;

    assert_eq!(db.get_grant(owner.id, repo.id).await.unwrap(), None);

    db.grant_access(owner.id, repo.id, AccessGrant::read_only())
        .await
        .unwrap();
    db.grant_access(owner.id, repo.id, AccessGrant::push())
        .await
        .unwrap();

    assert_eq!(
        db.get_grant(owner.id, repo.id).await.unwrap(),
        Some(AccessGrant::push())
    );

    assert!(db.revoke_access(owner.id, repo.id).await.unwrap());
    assert_eq!(db.get_grant(owner.id, repo.id).await.unwrap(), None);
}

// === Build and job tests ===

#[tokio::test]
async fn build_state_round_trips_through_text() {
    let db = test_db().await;
    let (_, repo) = owner_and_repo(&db).await;

    let build = db
        .create_build(7, repo.id, "1", State::Started)
        .await
        .unwrap();
    assert_eq!(build.state().unwrap(), State::Started);

    db.set_build_state(7, State::Canceled).await.unwrap();
    assert_eq!(db.get_build(7).await.unwrap().state().unwrap(), State::Canceled);
}

#[tokio::test]
async fn unknown_state_is_reported_as_corrupt() {
    let db = test_db().await;
    let (_, repo) = owner_and_repo(&db).await;
    db.create_build(7, repo.id, "1", State::Started)
        .await
        .unwrap();

    sqlx::query("UPDATE builds SET state = 'exploded' WHERE id = 7")
        .execute(db.pool())
        .await
        .unwrap();

    let err = db.get_build(7).await.unwrap().state().unwrap_err();
    assert!(matches!(err, super::DatabaseError::Corrupt(_)));
}

#[tokio::test]
async fn job_inherits_build_repository() {
    let db = test_db().await;
    let (_, repo) = owner_and_repo(&db).await;
    let build = db
        .create_build(7, repo.id, "1", State::Passed)
        .await
        .unwrap();

    let job = db.create_job(70, &build, "1.1", State::Failed).await.unwrap();
    assert_eq!(job.build_id, build.id);
    assert_eq!(job.repository_id, repo.id);
    assert_eq!(job.state().unwrap(), State::Failed);
}

#[tokio::test]
async fn job_state_can_be_updated() {
    let db = test_db().await;
    let (_, repo) = owner_and_repo(&db).await;
    let build = db
        .create_build(7, repo.id, "1", State::Started)
        .await
        .unwrap();
    db.create_job(70, &build, "1.1", State::Started).await.unwrap();

    assert!(db.set_job_state(70, State::Errored).await.unwrap());
    assert_eq!(db.get_job(70).await.unwrap().state().unwrap(), State::Errored);
    assert!(!db.set_job_state(999, State::Passed).await.unwrap());
}

// === Cron tests ===

#[tokio::test]
async fn cron_is_unique_per_branch() {
    let db = test_db().await;
    let (owner, repo) = owner_and_repo(&db).await;
    let branch = db.create_branch(1, repo.id, "master", true).await.unwrap();

    let params = NewCron {
        branch_id: branch.id,
        interval: CronInterval::Daily,
        disable_by_build: false,
        created_by: owner.id,
    };
    let cron = db.create_cron(&params).await.unwrap();
    assert_eq!(cron.interval().unwrap(), CronInterval::Daily);
    assert_eq!(cron.next_run_at - cron.created_at, CronInterval::Daily.period_secs());

    assert!(db.create_cron(&params).await.is_err());

    assert!(db.delete_cron(cron.id).await.unwrap());
    assert_eq!(db.get_branch_cron(branch.id).await.unwrap().map(|c| c.id), None);
    db.create_cron(&params).await.unwrap();
    assert_eq!(db.count_branch_crons(branch.id).await.unwrap(), 1);
}

// === Queue tests ===

#[tokio::test]
async fn queue_messages_are_fifo_per_queue() {
    let db = test_db().await;

    let first = db
        .push_queue_message("build_cancellations", "W::BuildCancellation", "[1]")
        .await
        .unwrap();
    db.push_queue_message("job_restarts", "W::JobRestart", "[2]")
        .await
        .unwrap();
    db.push_queue_message("build_cancellations", "W::BuildCancellation", "[3]")
        .await
        .unwrap();

    let messages = db.queue_messages("build_cancellations").await.unwrap();
    let args: Vec<_> = messages.iter().map(|m| m.args.as_str()).collect();
    assert_eq!(args, ["[1]", "[3]"]);

    assert!(db.ack_queue_message(first).await.unwrap());
    assert_eq!(db.count_queue_messages("build_cancellations").await.unwrap(), 1);
    assert_eq!(db.count_queue_messages("job_restarts").await.unwrap(), 1);
}

#[tokio::test]
async fn replace_branch_cron_keeps_one_row() {
    let db = test_db().await;
    let (owner, repo) = owner_and_repo(&db).await;
    let branch = db.create_branch(1, repo.id, "master", true).await.unwrap();

    let daily = NewCron {
        branch_id: branch.id,
        interval: CronInterval::Daily,
        disable_by_build: false,
        created_by: owner.id,
    };
    let first = db.replace_branch_cron(&daily).await.unwrap();

    let weekly = NewCron {
        interval: CronInterval::Weekly,
        disable_by_build: true,
        ..daily
    };
    let second = db.replace_branch_cron(&weekly).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(db.count_branch_crons(branch.id).await.unwrap(), 1);
    let stored = db.get_branch_cron(branch.id).await.unwrap().unwrap();
    assert_eq!(stored.id, second.id);
    assert_eq!(stored.interval().unwrap(), CronInterval::Weekly);
    assert!(db.get_cron(first.id).await.is_err());
}
