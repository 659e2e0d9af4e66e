use std::time::Duration;

use sqlx::mysql::MySqlPoolOptions;
use wormhole_core::UrlHash;
use wormhole_storage::{
    Acquired, InsertOutcome, MySqlRepository, ReadRepository, Repository,
};
use wormhole_test_infra::mysql::MySqlServer;

struct Fixture {
    _mysql: MySqlServer,
    repo: MySqlRepository,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::start().await.expect("start mysql");
        let url = mysql.database_url().await.expect("mysql url");
        let pool = connect_with_retry(&url).await;

        let repo = MySqlRepository::new(pool);
        repo.ensure_schema().await.expect("create schema");

        Self {
            _mysql: mysql,
            repo,
        }
    }
}

async fn connect_with_retry(url: &str) -> sqlx::MySqlPool {
    let mut last_error = None;

    for _ in 0..20 {
        match MySqlPoolOptions::new()
            .max_connections(16)
            .connect(url)
            .await
        {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect mysql: {last_error:?}");
}

#[tokio::test]
async fn insert_and_find_by_hash() {
    let fixture = Fixture::start().await;
    let url = "http://example.org/";
    let hash = UrlHash::of(url);

    let outcome = fixture.repo.insert(url, &hash).await.unwrap();
    let InsertOutcome::Inserted(id) = outcome else {
        panic!("expected an insert, got {outcome:?}");
    };

    let entry = fixture.repo.find_by_hash(&hash).await.unwrap().unwrap();
    assert_eq!(entry.id, id);
    assert_eq!(entry.url, url);
    assert_eq!(entry.url_hash, hash);
    assert!(!entry.deleted);
}

#[tokio::test]
async fn duplicate_hash_is_a_conflict_not_an_error() {
    let fixture = Fixture::start().await;
    let url = "http://example.org/dup";
    let hash = UrlHash::of(url);

    fixture.repo.insert(url, &hash).await.unwrap();
    let outcome = fixture.repo.insert(url, &hash).await.unwrap();

    assert_eq!(outcome, InsertOutcome::Conflict);
    assert!(fixture.repo.find_id_for_update(&hash).await.unwrap().is_some());
}

#[tokio::test]
async fn soft_delete_and_restore() {
    let fixture = Fixture::start().await;
    let url = "http://example.org/1";
    let id = fixture.repo.get_or_create(url).await.unwrap().id();

    assert!(fixture.repo.soft_delete(id).await.unwrap());
    assert!(fixture.repo.resolve(id).await.unwrap().is_none());
    assert!(fixture.repo.is_deleted(id).await.unwrap());
    // deleting twice still finds the row
    assert!(fixture.repo.soft_delete(id).await.unwrap());
    assert_eq!(
        fixture.repo.get_or_create(url).await.unwrap(),
        Acquired::Deleted(id)
    );

    assert!(fixture.repo.restore(id).await.unwrap());
    assert_eq!(fixture.repo.resolve(id).await.unwrap().as_deref(), Some(url));
    assert!(!fixture.repo.is_deleted(id).await.unwrap());
}

#[tokio::test]
async fn missing_rows_are_reported() {
    let fixture = Fixture::start().await;

    assert!(!fixture.repo.soft_delete(999).await.unwrap());
    assert!(!fixture.repo.restore(999).await.unwrap());
    assert!(fixture.repo.resolve(999).await.unwrap().is_none());
}

#[tokio::test]
async fn scan_active_pages_in_id_order() {
    let fixture = Fixture::start().await;
    let mut ids = vec![];
    for i in 0..5 {
        let url = format!("http://example.org/{i}");
        ids.push(fixture.repo.get_or_create(&url).await.unwrap().id());
    }
    fixture.repo.soft_delete(ids[1]).await.unwrap();

    let page = fixture.repo.scan_active(0, 2).await.unwrap();
    let got: Vec<u64> = page.iter().map(|e| e.id).collect();
    assert_eq!(got, [ids[0], ids[2]]);

    let page = fixture.repo.scan_active(ids[2], 10).await.unwrap();
    let got: Vec<u64> = page.iter().map(|e| e.id).collect();
    assert_eq!(got, [ids[3], ids[4]]);
}

#[tokio::test]
async fn concurrent_get_or_create_writes_one_row() {
    let fixture = Fixture::start().await;
    let mut handles = vec![];

    for _ in 0..12 {
        let repo = fixture.repo.clone();
        handles.push(tokio::spawn(async move {
            repo.get_or_create("http://example.org/race").await.unwrap()
        }));
    }

    let mut ids = vec![];
    for handle in handles {
        ids.push(handle.await.unwrap().id());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shortcodes")
        .fetch_one(fixture.repo.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}
