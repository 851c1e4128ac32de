use super::*;

#[test]
fn store_lookup_and_ids_are_sorted() {
    let mut s = ImageStore::new();
    s.insert("b", Raster::new(1, 1, false, false).unwrap());
    s.insert("a", Raster::new(2, 1, true, false).unwrap());
    assert!(s.contains("a"));
    assert_eq!(s.get("a").unwrap().width(), 2);
    assert_eq!(s.ids().collect::<Vec<_>>(), vec!["a", "b"]);
    assert!(s.get("c").is_none());
}

#[test]
fn local_cache_reports_and_clears() {
    let mut c = ImageCache::default();
    c.insert("k1".to_string(), Arc::new(Raster::new(2, 2, false, false).unwrap()));
    c.insert("k2".to_string(), Arc::new(Raster::new(1, 1, true, false).unwrap()));
    assert_eq!(
        c.report(),
        CacheReport {
            images: 2,
            bytes: (4 + 3) * 8
        }
    );
    assert!(c.get("k1").is_some());
    let freed = c.clear();
    assert_eq!(freed.images, 2);
    assert_eq!(c.report(), CacheReport::default());
}

#[test]
fn scope_defaults_to_the_target_image() {
    let mut s = ImageStore::new();
    s.insert("main", Raster::new(3, 1, false, false).unwrap());
    let scope = ImageScope::new(&s, Some("main"));
    assert_eq!(scope.find(None).unwrap().width(), 3);
    assert_eq!(scope.find(Some("$T")).unwrap().width(), 3);
    assert_eq!(scope.canonical(Some("$target")).unwrap(), "main");
    assert!(scope.find(Some("other")).is_err());

    let orphan = ImageScope::new(&s, None);
    assert!(orphan.find(None).is_err());
    assert!(orphan.find(Some("main")).is_ok());
}
