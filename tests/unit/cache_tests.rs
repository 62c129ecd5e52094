/*!
 * Tests for the shared translation cache
 */

use std::thread;

use linewise::translation::TranslationCache;

#[test]
fn test_cache_shouldKeyOnExactCompositeText() {
    let cache = TranslationCache::default();
    cache.store("a\n---\nb", "en", "fr", "x\n---\ny");

    assert_eq!(cache.get("a\n---\nb", "en", "fr"), Some("x\n---\ny".to_string()));
    assert_eq!(cache.get("a\n---\nb ", "en", "fr"), None);
    assert_eq!(cache.get("b\n---\na", "en", "fr"), None);
}

#[test]
fn test_store_withSameKey_shouldKeepLatestValue() {
    let cache = TranslationCache::default();
    cache.store("hello", "en", "fr", "salut");
    cache.store("hello", "en", "fr", "bonjour");

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("hello", "en", "fr"), Some("bonjour".to_string()));
}

#[test]
fn test_clear_shouldResetEntriesAndCounters() {
    let cache = TranslationCache::default();
    cache.store("hello", "en", "fr", "bonjour");
    cache.get("hello", "en", "fr");
    cache.get("bye", "en", "fr");

    cache.clear();

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.entries), (0, 0, 0));
    assert_eq!(stats.hit_rate(), 0.0);
}

#[test]
fn test_cache_withConcurrentWriters_shouldKeepEveryEntry() {
    let cache = TranslationCache::default();

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    let text = format!("{}-{}", worker, i);
                    cache.store(&text, "en", "fr", &text.to_uppercase());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 400);
    assert_eq!(cache.get("7-49", "en", "fr"), Some("7-49".to_string()));
}
