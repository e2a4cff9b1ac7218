use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate};
use tokio_postgres::{Config, NoTls};

/// Hourly starts inside the default 09:00-21:00 opening hours with 2h slots.
const STARTS: [&str; 11] = [
    "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00", "18:00",
    "19:00",
];

async fn connect(host: &str, port: u16) -> tokio_postgres::Client {
    let mut config = Config::new();
    config
        .host(host)
        .port(port)
        .dbname("tablebook")
        .user("tablebook")
        .password(std::env::var("TABLEBOOK_PASSWORD").unwrap_or_else(|_| "tablebook".into()));

    let (client, conn) = config.connect(NoTls).await.expect("connect failed");
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            eprintln!("connection error: {e}");
        }
    });
    client
}

/// Date `offset` days after the bench's base day; each phase books its own range.
fn day(offset: u64) -> String {
    let base = NaiveDate::from_ymd_opt(2030, 1, 1).expect("valid base date");
    (base + Days::new(offset)).format("%Y-%m-%d").to_string()
}

fn insert_sql(name: &str, party: u32, date: &str, time: &str) -> String {
    format!(
        "INSERT INTO reservations (customer_name, party_size, date, time) \
         VALUES ('{name}', {party}, '{date}', '{time}')"
    )
}

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        println!("  {label}: no samples");
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

async fn phase1_sequential(host: &str, port: u16) {
    let client = connect(host, port).await;

    let n = 2000;
    let mut latencies = Vec::with_capacity(n);
    let mut rejected = 0;
    let start = Instant::now();

    for i in 0..n {
        let date = day((i / STARTS.len()) as u64);
        let time = STARTS[i % STARTS.len()];
        let t = Instant::now();
        if client
            .batch_execute(&insert_sql(&format!("seq {i}"), 2, &date, time))
            .await
            .is_err()
        {
            rejected += 1;
        }
        latencies.push(t.elapsed());
    }

    let elapsed = start.elapsed();
    let ops = n as f64 / elapsed.as_secs_f64();
    println!(
        "  {n} inserts ({rejected} rejected) in {:.2}s = {ops:.0} ops/sec",
        elapsed.as_secs_f64()
    );
    print_latency("write latency", &mut latencies);
}

/// Every task hammers the same slots, so most of the load is admission contention.
async fn phase2_contended(host: &str, port: u16) {
    let n_tasks = 10;
    let n_per_task = 200;
    let admitted = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let mut handles = Vec::new();

    for t in 0..n_tasks {
        let host = host.to_string();
        let admitted = admitted.clone();
        handles.push(tokio::spawn(async move {
            let client = connect(&host, port).await;
            for j in 0..n_per_task {
                let date = day(1000 + (j / STARTS.len()) as u64);
                let time = STARTS[j % STARTS.len()];
                let sql = insert_sql(&format!("task {t} #{j}"), 2, &date, time);
                if client.batch_execute(&sql).await.is_ok() {
                    admitted.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }

    for h in handles {
        h.await.unwrap();
    }

    let elapsed = start.elapsed();
    let total = n_tasks * n_per_task;
    let ops = total as f64 / elapsed.as_secs_f64();
    println!(
        "  {n_tasks} tasks x {n_per_task} inserts = {total} total ({} admitted) in {:.2}s = {ops:.0} ops/sec",
        admitted.load(Ordering::Relaxed),
        elapsed.as_secs_f64()
    );
}

async fn phase3_read_under_load(host: &str, port: u16) {
    let setup_client = connect(host, port).await;
    for i in 0..200 {
        let date = day(2000 + (i / STARTS.len()) as u64);
        let _ = setup_client
            .batch_execute(&insert_sql(&format!("pre {i}"), 4, &date, STARTS[i % STARTS.len()]))
            .await;
    }
    drop(setup_client);

    let stop = Arc::new(AtomicBool::new(false));
    let mut writer_handles = Vec::new();
    for w in 0..5u64 {
        let host = host.to_string();
        let stop = stop.clone();
        writer_handles.push(tokio::spawn(async move {
            let client = connect(&host, port).await;
            let mut i = 0usize;
            while !stop.load(Ordering::Relaxed) {
                let date = day(3000 + w * 10_000 + (i / STARTS.len()) as u64);
                let _ = client
                    .batch_execute(&insert_sql("writer", 2, &date, STARTS[i % STARTS.len()]))
                    .await;
                i += 1;
            }
        }));
    }

    let n_readers = 10;
    let reads_per_reader = 500;
    let mut reader_handles = Vec::new();

    for r in 0..n_readers {
        let host = host.to_string();
        reader_handles.push(tokio::spawn(async move {
            let client = connect(&host, port).await;
            let mut latencies = Vec::with_capacity(reads_per_reader);
            for i in 0..reads_per_reader {
                let date = day(2000 + ((r + i) % 18) as u64);
                let sql = if i % 2 == 0 {
                    format!("SELECT * FROM reservations WHERE date = '{date}'")
                } else {
                    format!(
                        "SELECT * FROM availability WHERE date = '{date}' AND time = '{}'",
                        STARTS[i % STARTS.len()]
                    )
                };
                let t = Instant::now();
                client.batch_execute(&sql).await.unwrap();
                latencies.push(t.elapsed());
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for h in reader_handles {
        all_latencies.extend(h.await.unwrap());
    }

    stop.store(true, Ordering::Relaxed);
    for h in writer_handles {
        let _ = h.await;
    }

    print_latency("day / availability query", &mut all_latencies);
}

async fn phase4_connection_storm(host: &str, port: u16) {
    let n_conns = 50;
    let ops_per_conn = 10;

    let start = Instant::now();
    let mut handles = Vec::new();
    let success = Arc::new(AtomicUsize::new(0));

    for c in 0..n_conns {
        let host = host.to_string();
        let success = success.clone();
        handles.push(tokio::spawn(async move {
            let client = connect(&host, port).await;
            for i in 0..ops_per_conn {
                let date = day(100_000 + c as u64);
                let _ = client
                    .batch_execute(&insert_sql("storm", 2, &date, STARTS[i % STARTS.len()]))
                    .await;
            }
            success.fetch_add(1, Ordering::Relaxed);
        }));
    }

    for h in handles {
        let _ = h.await;
    }

    let elapsed = start.elapsed();
    let ok = success.load(Ordering::Relaxed);
    println!(
        "  {n_conns} connections, {ops_per_conn} ops each: {ok}/{n_conns} succeeded in {:.2}s",
        elapsed.as_secs_f64()
    );
}

#[tokio::main]
async fn main() {
    let host = std::env::var("TABLEBOOK_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port: u16 = std::env::var("TABLEBOOK_PORT")
        .unwrap_or_else(|_| "5433".into())
        .parse()
        .expect("invalid TABLEBOOK_PORT");

    println!("=== tablebook stress benchmark ===");
    println!("target: {host}:{port}\n");

    println!("[phase 1] sequential write throughput");
    phase1_sequential(&host, port).await;

    println!("\n[phase 2] contended write throughput");
    phase2_contended(&host, port).await;

    println!("\n[phase 3] read latency under write load");
    phase3_read_under_load(&host, port).await;

    println!("\n[phase 4] connection storm");
    phase4_connection_storm(&host, port).await;

    println!("\n=== benchmark complete ===");
}
