//! Performance benchmarks for haraj-digest.
//!
//! Run with: `cargo bench`
//!
//! Benchmarks include:
//! - A small synthetic listing (a handful of cards) for microbenchmarks
//! - Generated listings of growing size to watch extraction scale
//! - Reconciliation of a full store into a digest

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use haraj_digest::{extract_ads, reconcile, AdRecord, Options, Store};

const SAMPLE_HTML: &str = r#"
<!DOCTYPE html>
<html lang="ar" dir="rtl">
<head><meta charset="UTF-8"><title>حراج</title></head>
<body>
    <nav><a href="/">الرئيسية</a><a href="/add">إضافة عرض</a></nav>
    <div class="posts">
        <div class="post">
            <a data-testid="post-title-link" href="/12345678/تويوتا-كامري">
                <span class="overflow-hidden text-ellipsis">تويوتا كامري 2020 فل كامل</span>
            </a>
            <a href="/city/الرياض">الرياض</a>
            <span dir="rtl" class="max-w-[90%] overflow-hidden overflow-ellipsis whitespace-nowrap">قبل 3 ساعات</span>
            <svg data-icon="comments-alt"></svg><span>١٢</span>
        </div>
        <div class="post">
            <a href="/87654321"><span class="overflow-hidden text-ellipsis">شقة للإيجار حي النرجس</span></a>
            <a href="/city/جدة">جدة</a>
            <span dir="rtl">الآن</span>
        </div>
    </div>
    <button><span>مشاهدة المزيد</span></button>
</body>
</html>
"#;

fn listing(cards: usize) -> String {
    let mut html = String::from("<html><body><div class=\"posts\">");
    for i in 0..cards {
        html.push_str(&format!(
            r#"<div class="post"><a href="/{id}"><span class="overflow-hidden text-ellipsis">سيارة للبيع رقم {i}</span></a><a href="/city/الرياض">الرياض</a><span dir="rtl">قبل {m} دقائق</span><svg data-icon="comments-alt"></svg><span>{r}</span></div>"#,
            id = 10_000_000 + i,
            m = i % 60,
            r = i % 200,
        ));
    }
    html.push_str("</div></body></html>");
    html
}

fn bench_extract_sample(c: &mut Criterion) {
    let options = Options::default();
    c.bench_function("extract_sample", |b| {
        b.iter(|| extract_ads(black_box(SAMPLE_HTML), black_box(&options)));
    });
}

/// Extraction over listings of increasing length
fn bench_extract_listing(c: &mut Criterion) {
    let options = Options::default();
    let mut group = c.benchmark_group("listing");

    for cards in [20usize, 100, 400] {
        let html = listing(cards);
        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(BenchmarkId::new("extract", cards), &html, |b, html| {
            b.iter(|| extract_ads(black_box(html), black_box(&options)));
        });
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let options = Options::default();
    let Some(now) = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single() else {
        return;
    };
    let ads: Vec<AdRecord> = (0..1000u32)
        .map(|i| AdRecord {
            id: (10_000_000 + i).to_string(),
            description: format!("إعلان رقم {i}"),
            city: "جدة".to_string(),
            relative_time: "الآن".to_string(),
            reply_count: i % 200,
            link: format!("https://haraj.com.sa/{}", 10_000_000 + i),
        })
        .collect();

    c.bench_function("reconcile_1000", |b| {
        b.iter(|| reconcile(Store::new(), black_box(&ads), now, &options));
    });
}

criterion_group!(
    benches,
    bench_extract_sample,
    bench_extract_listing,
    bench_reconcile
);
criterion_main!(benches);
