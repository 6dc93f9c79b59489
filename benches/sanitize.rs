use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spider_sanitizer::{parse, serialize, Policy, PolicyBuilder, Sanitizer};

// ---------------------------------------------------------------------------
// Fixture generators
// ---------------------------------------------------------------------------

/// Build a realistic user content document with a mix of safe and hostile markup.
fn generate_html(num_elements: usize) -> String {
    let mut html = String::from(
        "<!DOCTYPE html><html><head><title>Bench</title>\
         <style>body{margin:0}</style><script>window.__data={init:true};</script></head><body>\
         <main>",
    );
    for i in 0..num_elements {
        match i % 7 {
            0 => html.push_str(&format!(
                "<div class=\"card\" id=\"c{i}\"><h2>Title {i}</h2><p>Description for item {i} with some text.</p></div>"
            )),
            1 => html.push_str(&format!(
                "<a href=\"https://spider.cloud/page/{i}\" onclick=\"track({i})\">Link {i}</a>"
            )),
            2 => html.push_str(&format!(
                "<script>console.log('script-{i}');</script>"
            )),
            3 => html.push_str(&format!(
                "<a href=\"java&#x09;script:alert({i})\">bad {i}</a>"
            )),
            4 => html.push_str(&format!(
                "<svg viewBox=\"0 0 100 100\"><circle cx=\"50\" cy=\"50\" r=\"{}\"/></svg>",
                i % 50
            )),
            5 => html.push_str(&format!(
                "<img src=\"/img/{i}.jpg\" alt=\"Image {i}\" loading=\"lazy\" srcset=\"/img/{i}@2x.jpg 2x\">"
            )),
            _ => html.push_str(&format!(
                "<p data-id=\"{i}\">Paragraph {i} with <strong>bold</strong> &amp; <em>italic</em> text.<p>unclosed"
            )),
        }
    }
    html.push_str("</main><footer><p>Copyright 2025</p></footer></body></html>");
    html
}

const SIZES: [(&str, usize); 3] = [("small-1KB", 8), ("medium-50KB", 400), ("large-200KB", 1600)];

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize");

    let mut links = PolicyBuilder::ugc();
    links
        .require_noreferrer_on_links(true)
        .add_target_blank_to_fully_qualified_links(true);

    let policies = [
        ("ugc", Sanitizer::new(Policy::ugc())),
        ("strict", Sanitizer::new(Policy::strict())),
        ("ugc-links", Sanitizer::new(links.build())),
    ];

    for (label, count) in &SIZES {
        let html = generate_html(*count);
        group.throughput(Throughput::Bytes(html.len() as u64));

        for (name, sanitizer) in &policies {
            group.bench_with_input(BenchmarkId::new(*name, label), &html, |b, h| {
                b.iter(|| sanitizer.sanitize(black_box(h)))
            });
        }
    }

    group.finish();
}

fn bench_parse_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse-serialize");

    for (label, count) in &SIZES {
        let html = generate_html(*count);
        let tree = parse(&html);
        group.throughput(Throughput::Bytes(html.len() as u64));

        group.bench_with_input(BenchmarkId::new("parse", label), &html, |b, h| {
            b.iter(|| parse(black_box(h)))
        });
        group.bench_with_input(BenchmarkId::new("serialize", label), &tree, |b, t| {
            b.iter(|| serialize(black_box(t)))
        });
    }

    group.finish();
}

fn bench_policy_build(c: &mut Criterion) {
    c.bench_function("policy-build/ugc", |b| {
        b.iter(|| black_box(PolicyBuilder::ugc()).build())
    });
}

// ---------------------------------------------------------------------------
// Criterion harness
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_sanitize,
    bench_parse_serialize,
    bench_policy_build
);
criterion_main!(benches);
