use std::collections::BTreeMap;
use std::net::UdpSocket;
use std::time::Duration;

use ctxcache::config::Metrics;
use ctxcache::{Config, ContextCache};
use ctxcache_store::Store;

use crate::utils::test;

#[test]
fn test_init_reports_metrics() {
    test::setup();

    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    let config = Config {
        metrics: Metrics {
            statsd: Some(socket.local_addr().unwrap().to_string()),
            prefix: "ctxcache".into(),
            custom_tags: BTreeMap::from([("region".into(), "test".into())]),
        },
        ..Default::default()
    };
    ctxcache::init(&config).unwrap();

    // metrics can only be configured once per process
    assert!(ctxcache::init(&config).is_err());

    let store = Store::create().set("A.f1", "metrics").build();
    ContextCache::global().create::<test::A>(&store).unwrap();

    // other tests report to the same socket, so skip unrelated datagrams
    let mut buf = [0; 1024];
    let access = loop {
        let len = socket.recv(&mut buf).unwrap();
        let datagram = String::from_utf8_lossy(&buf[..len]).into_owned();
        if datagram.starts_with("ctxcache.contexts.access:1|c")
            && datagram.contains("context:ctxcache_test::A")
        {
            break datagram;
        }
    };
    assert!(access.contains("region:test"));
}
