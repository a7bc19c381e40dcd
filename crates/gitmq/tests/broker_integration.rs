//! End-to-end broker tests over a local bare remote
//!
//! Every test provisions its own bare repository as the "broker" and talks
//! to it through real clones, exactly as production peers would.

use git2::Repository;
use tempfile::TempDir;

use gitmq::{Author, BrokerClient, BrokerConfig, WorkingCopy};

fn init_bare_remote() -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    Repository::init_bare(dir.path()).unwrap();
    let url = format!("file://{}", dir.path().display());
    (dir, url)
}

fn config(url: &str, name: &str) -> BrokerConfig {
    BrokerConfig {
        broker_url: url.to_string(),
        author: Author {
            name: name.to_string(),
            email: format!("{}@example.com", name),
        },
        credentials: None,
    }
}

/// Fresh clone of the topic for asserting on the remote's file set.
fn remote_listing(url: &str, topic: &str) -> Vec<String> {
    let dir = TempDir::new().unwrap();
    let copy = WorkingCopy::provision(
        dir.path(),
        url,
        topic,
        Author {
            name: "verifier".to_string(),
            email: "verifier@example.com".to_string(),
        },
        None,
    )
    .unwrap();
    copy.list_log_files().unwrap()
}

fn checkpoint_count(listing: &[String], node: &str) -> usize {
    let suffix = format!("_{}_OK.json", node);
    listing.iter().filter(|n| n.ends_with(&suffix)).count()
}

#[test]
fn test_consumer_on_missing_topic_returns_empty() {
    let (_remote, url) = init_bare_remote();
    let client = BrokerClient::new(config(&url, "c1"));

    let consumer = client.create_consumer("orders", "c1").unwrap();
    assert!(consumer.batch_receive().unwrap().is_empty());
    // And no checkpoint was invented for the empty cycle.
    assert!(remote_listing(&url, "orders").is_empty());
}

#[test]
fn test_first_run_delivers_everything_in_publish_order() {
    let (_remote, url) = init_bare_remote();
    let client = BrokerClient::new(config(&url, "peer"));

    let producer = client.create_producer("orders", "p1").unwrap();
    producer.publish("ORDER", "first").unwrap();
    producer.publish("ORDER", "second").unwrap();
    producer.publish("SHIP", "third").unwrap();

    let consumer = client.create_consumer("orders", "c1").unwrap();
    let batch = consumer.batch_receive().unwrap();

    let bodies: Vec<&str> = batch.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["first", "second", "third"]);
    assert!(batch.windows(2).all(|w| w[0].order_key < w[1].order_key));

    let listing = remote_listing(&url, "orders");
    assert_eq!(checkpoint_count(&listing, "c1"), 1);
}

#[test]
fn test_delivery_resumes_after_existing_checkpoint() {
    let (_remote, url) = init_bare_remote();

    // Seed the topic directly: messages 10..40 plus a checkpoint at 20.
    let seed_dir = TempDir::new().unwrap();
    let seed = WorkingCopy::provision(
        seed_dir.path(),
        &url,
        "orders",
        Author {
            name: "seeder".to_string(),
            email: "seeder@example.com".to_string(),
        },
        None,
    )
    .unwrap();
    for (name, body) in [
        ("10_p_E.json", "ten"),
        ("20_p_E.json", "twenty"),
        ("20_c1_OK.json", "PROCESSED"),
        ("30_p_E.json", "thirty"),
        ("40_p_E.json", "forty"),
    ] {
        seed.write_and_commit(name, body).unwrap();
    }
    seed.push().unwrap();

    let client = BrokerClient::new(config(&url, "peer"));
    let consumer = client.create_consumer("orders", "c1").unwrap();
    let batch = consumer.batch_receive().unwrap();

    let keys: Vec<u64> = batch.iter().map(|m| m.order_key).collect();
    assert_eq!(keys, vec![30, 40]);

    // The new checkpoint sits past everything it covered.
    let listing = remote_listing(&url, "orders");
    assert_eq!(checkpoint_count(&listing, "c1"), 2);
    let latest_checkpoint: u64 = listing
        .iter()
        .filter(|n| n.ends_with("_c1_OK.json"))
        .map(|n| n.split('_').next().unwrap().parse().unwrap())
        .max()
        .unwrap();
    assert!(latest_checkpoint > 40);
}

#[test]
fn test_second_receive_is_empty_and_writes_no_checkpoint() {
    let (_remote, url) = init_bare_remote();
    let client = BrokerClient::new(config(&url, "peer"));

    let producer = client.create_producer("orders", "p1").unwrap();
    producer.publish("ORDER", "only").unwrap();

    let consumer = client.create_consumer("orders", "c1").unwrap();
    assert_eq!(consumer.batch_receive().unwrap().len(), 1);
    assert!(consumer.batch_receive().unwrap().is_empty());

    let listing = remote_listing(&url, "orders");
    assert_eq!(checkpoint_count(&listing, "c1"), 1);
}

#[test]
fn test_two_consumers_track_independent_cursors() {
    let (_remote, url) = init_bare_remote();
    let client = BrokerClient::new(config(&url, "peer"));

    let producer = client.create_producer("orders", "p1").unwrap();
    producer.publish("ORDER", "a").unwrap();

    let c1 = client.create_consumer("orders", "c1").unwrap();
    assert_eq!(c1.batch_receive().unwrap().len(), 1);

    // c1's checkpoint must not advance c2's cursor.
    let c2 = client.create_consumer("orders", "c2").unwrap();
    let batch = c2.batch_receive().unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].body, "a");
}

#[test]
fn test_acknowledge_removes_the_message_from_the_remote() {
    let (_remote, url) = init_bare_remote();
    let client = BrokerClient::new(config(&url, "peer"));

    let producer = client.create_producer("orders", "p1").unwrap();
    let published = producer.publish("ORDER", "remove me").unwrap();

    let consumer = client.create_consumer("orders", "c1").unwrap();
    let batch = consumer.batch_receive().unwrap();
    assert_eq!(batch[0].file_name, published.file_name);

    consumer.acknowledge(&batch[0]).unwrap();
    let listing = remote_listing(&url, "orders");
    assert!(!listing.contains(&published.file_name));

    // Acknowledging an already-removed message is a no-op.
    consumer.acknowledge(&batch[0]).unwrap();
}

#[test]
fn test_bodies_are_opaque_and_survive_round_trip() {
    let (_remote, url) = init_bare_remote();
    let client = BrokerClient::new(config(&url, "peer"));

    let payload = serde_json::json!({
        "order": 42,
        "items": ["a_b", "c/d"],
        "nested": { "ok": true }
    })
    .to_string();

    let producer = client.create_producer("orders", "p1").unwrap();
    producer.publish("ORDER", &payload).unwrap();

    let consumer = client.create_consumer("orders", "c1").unwrap();
    let batch = consumer.batch_receive().unwrap();
    assert_eq!(batch[0].body, payload);

    let parsed: serde_json::Value = serde_json::from_str(&batch[0].body).unwrap();
    assert_eq!(parsed["order"], 42);
}

#[test]
fn test_concurrent_producers_never_collide() {
    let (_remote, url) = init_bare_remote();
    let client = BrokerClient::new(config(&url, "peer"));

    let per_producer = 5;
    std::thread::scope(|scope| {
        for node in ["p1", "p2"] {
            let client = &client;
            scope.spawn(move || {
                let producer = client.create_producer("orders", node).unwrap();
                for i in 0..per_producer {
                    producer
                        .publish("ORDER", &format!("{} message {}", node, i))
                        .unwrap();
                }
            });
        }
    });

    let consumer = client.create_consumer("orders", "c1").unwrap();
    let batch = consumer.batch_receive().unwrap();
    assert_eq!(batch.len(), per_producer * 2);

    let mut names: Vec<&str> = batch.iter().map(|m| m.file_name.as_str()).collect();
    let total = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), total, "filename collision between producers");
}

#[test]
fn test_independent_clients_share_one_topic() {
    let (_remote, url) = init_bare_remote();

    let client_a = BrokerClient::new(config(&url, "peer-a"));
    let client_b = BrokerClient::new(config(&url, "peer-b"));
    let producer_a = client_a.create_producer("orders", "pa").unwrap();
    let producer_b = client_b.create_producer("orders", "pb").unwrap();

    producer_a.publish("ORDER", "from a").unwrap();
    producer_b.publish("ORDER", "from b").unwrap();

    let consumer = client_a.create_consumer("orders", "c1").unwrap();
    let bodies: Vec<String> = consumer
        .batch_receive()
        .unwrap()
        .into_iter()
        .map(|m| m.body)
        .collect();
    assert!(bodies.contains(&"from a".to_string()));
    assert!(bodies.contains(&"from b".to_string()));
}
