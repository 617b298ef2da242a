//! Store-gateway integration tests: claim atomicity and idempotent
//! upserts against a real Postgres instance.

use crawlforge::repository::StoreGateway;
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_source(pool: &PgPool) -> Uuid {
    let owner = Uuid::new_v4();
    let conversation = Uuid::new_v4();
    let row: (Uuid,) = sqlx::query_as(
        r#"
        insert into sources (owner, conversation, initial_url, depth, same_domain_only, suggestion_mode)
        values ($1, $2, 'https://example.org/', 'shallow', true, 'surface')
        returning id
        "#,
    )
    .bind(owner)
    .bind(conversation)
    .fetch_one(pool)
    .await
    .expect("insert source");
    row.0
}

#[sqlx::test]
async fn claim_next_job_is_atomic_under_concurrent_claimers(pool: PgPool) {
    let store = StoreGateway::from_pool(pool.clone());
    let source_id = seed_source(&pool).await;
    store
        .create_job(source_id, None)
        .await
        .expect("create job");

    let (a, b) = tokio::join!(store.claim_next_job(), store.claim_next_job());
    let claimed: Vec<_> = [a.expect("claim a"), b.expect("claim b")]
        .into_iter()
        .flatten()
        .collect();

    assert_eq!(claimed.len(), 1, "exactly one concurrent claimer should win");
}

#[sqlx::test]
async fn insert_page_is_idempotent_on_source_and_url(pool: PgPool) {
    let store = StoreGateway::from_pool(pool.clone());
    let source_id = seed_source(&pool).await;
    let owner = Uuid::new_v4();

    let first = store
        .insert_page(
            source_id,
            owner,
            "https://example.org/a",
            "A",
            "/a",
            "content",
            crawlforge::models::PageStatus::Crawling,
        )
        .await
        .expect("first insert");

    let second = store
        .insert_page(
            source_id,
            owner,
            "https://example.org/a",
            "A changed",
            "/a",
            "different content",
            crawlforge::models::PageStatus::Crawling,
        )
        .await
        .expect("second insert");

    assert_eq!(first.id, second.id, "same natural key returns the existing row");
}

#[sqlx::test]
async fn upsert_edges_is_idempotent(pool: PgPool) {
    let store = StoreGateway::from_pool(pool.clone());
    let source_id = seed_source(&pool).await;
    let owner = Uuid::new_v4();

    let page = store
        .insert_page(
            source_id,
            owner,
            "https://example.org/",
            "Home",
            "/",
            "content",
            crawlforge::models::PageStatus::Crawling,
        )
        .await
        .expect("insert page");

    let urls = vec!["https://example.org/a".to_string()];
    let first = store.upsert_edges(page.id, owner, &urls).await.expect("first upsert");
    let second = store.upsert_edges(page.id, owner, &urls).await.expect("second upsert");

    assert_eq!(first[0].id, second[0].id);
}

#[sqlx::test]
async fn edges_for_to_url_scopes_by_source(pool: PgPool) {
    let store = StoreGateway::from_pool(pool.clone());
    let source_id = seed_source(&pool).await;
    let owner = Uuid::new_v4();

    let page = store
        .insert_page(
            source_id,
            owner,
            "https://example.org/",
            "Home",
            "/",
            "content",
            crawlforge::models::PageStatus::Crawling,
        )
        .await
        .expect("insert page");
    store
        .upsert_edges(page.id, owner, &["https://example.org/a".to_string()])
        .await
        .expect("upsert edge");

    let edges = store
        .edges_for_to_url(source_id, "https://example.org/a")
        .await
        .expect("query edges");
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].from_page, page.id);

    let other_source = seed_source(&pool).await;
    let edges = store
        .edges_for_to_url(other_source, "https://example.org/a")
        .await
        .expect("query edges for unrelated source");
    assert!(edges.is_empty());
}

#[sqlx::test]
async fn has_chunks_for_page_reflects_inserted_chunks(pool: PgPool) {
    let store = StoreGateway::from_pool(pool.clone());
    let source_id = seed_source(&pool).await;
    let owner = Uuid::new_v4();

    let page = store
        .insert_page(
            source_id,
            owner,
            "https://example.org/",
            "Home",
            "/",
            "content",
            crawlforge::models::PageStatus::Crawling,
        )
        .await
        .expect("insert page");

    assert!(!store.has_chunks_for_page(page.id).await.expect("check before insert"));

    store
        .insert_chunks(&[crawlforge::repository::NewChunk {
            page: page.id,
            owner,
            content: "content".to_string(),
            start_index: Some(0),
            end_index: Some(7),
            embedding: vec![0.0; 3],
        }])
        .await
        .expect("insert chunk");

    assert!(store.has_chunks_for_page(page.id).await.expect("check after insert"));
}

#[sqlx::test]
async fn recrawl_with_seeds_wipes_pages_and_queues_a_seeded_job(pool: PgPool) {
    let store = StoreGateway::from_pool(pool.clone());
    let source_id = seed_source(&pool).await;
    let owner = Uuid::new_v4();

    store
        .insert_page(
            source_id,
            owner,
            "https://example.org/stale",
            "Stale",
            "/stale",
            "content",
            crawlforge::models::PageStatus::Indexed,
        )
        .await
        .expect("insert stale page");

    let seeds = vec!["https://example.org/fresh".to_string()];
    let job = store
        .recrawl_with_seeds(source_id, seeds.clone())
        .await
        .expect("recrawl");

    assert_eq!(job.explicit_urls, Some(seeds));
    assert_eq!(job.status, crawlforge::models::JobStatus::Queued);

    let remaining = store
        .get_page_by_url(source_id, "https://example.org/stale")
        .await
        .expect("query stale page");
    assert!(remaining.is_none(), "re-crawl should have wiped the source's prior pages");
}

#[sqlx::test]
async fn claim_requeues_stale_running_jobs(pool: PgPool) {
    let store = StoreGateway::from_pool(pool.clone());
    let source_id = seed_source(&pool).await;
    let job = store.create_job(source_id, None).await.expect("create job");

    sqlx::query(
        "update crawl_jobs set status = 'running', last_activity_at = now() - interval '10 minutes' where id = $1",
    )
    .bind(job.id)
    .execute(&pool)
    .await
    .expect("force stale running state");

    let reclaimed = store
        .claim_next_job()
        .await
        .expect("claim")
        .expect("stale job should be requeued and reclaimed");
    assert_eq!(reclaimed.id, job.id);
}
