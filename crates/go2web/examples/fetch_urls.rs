//! Example: Fetch a few live URLs and check the extracted text
//!
//! Run with: cargo run -p go2web --example fetch_urls
//!
//! Uses a throwaway cache directory so every run goes to the network.

use go2web::{Client, ResponseCache};

/// Test case definition
struct TestCase {
    url: &'static str,
    description: &'static str,
    expect_contains: &'static str,
}

const TEST_CASES: &[TestCase] = &[
    TestCase {
        url: "example.com",
        description: "Scheme-less URL over plain HTTP",
        expect_contains: "documentation examples",
    },
    TestCase {
        url: "https://example.com",
        description: "HTTPS with certificate verification",
        expect_contains: "documentation examples",
    },
    TestCase {
        url: "http://httpbin.org/redirect/2",
        description: "Redirect chain ending at /get",
        expect_contains: "headers",
    },
    TestCase {
        url: "https://httpbin.org/gzip",
        description: "Gzip-encoded body",
        expect_contains: "gzipped",
    },
];

fn main() {
    println!("go2web URL Examples");
    println!("===================\n");

    let cache_dir = std::env::temp_dir().join(format!("go2web-example-{}", std::process::id()));
    let cache = match ResponseCache::new(&cache_dir) {
        Ok(cache) => cache,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let client = Client::new(cache);

    let mut passed = 0;
    let mut failed = 0;

    for (i, case) in TEST_CASES.iter().enumerate() {
        println!("{}. {}", i + 1, case.description);
        println!("   URL: {}", case.url);

        match client.fetch(case.url) {
            Ok(text) => {
                let preview = text.chars().take(100).collect::<String>().replace('\n', " ");
                println!(
                    "   Preview: {}{}",
                    preview,
                    if text.chars().count() > 100 { "..." } else { "" }
                );

                if text.contains(case.expect_contains) {
                    println!("   ✓ PASS\n");
                    passed += 1;
                } else {
                    println!("   Expected text to contain '{}'", case.expect_contains);
                    println!("   ✗ FAIL\n");
                    failed += 1;
                }
            }
            Err(e) => {
                println!("   Error: {}", e);
                println!("   ✗ FAIL\n");
                failed += 1;
            }
        }
    }

    let _ = std::fs::remove_dir_all(&cache_dir);

    println!("===================");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}
