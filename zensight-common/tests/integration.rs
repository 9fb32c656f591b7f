//! Integration tests for zensight-common library.

use zensight_common::{
    Format, KeyExprBuilder, MetricSample, Protocol, TelemetryPoint, decode, encode,
    parse_key_expr,
};

#[test]
fn test_sample_to_key_and_payload() {
    let sample = MetricSample::new("cluster.health.active_shards", 12.0)
        .expect("valid path")
        .prefixed("prod");

    let builder = KeyExprBuilder::new(Protocol::Elasticsearch);
    let key = builder.build("es1", &sample.path);
    assert_eq!(
        key,
        "zensight/elasticsearch/es1/prod.cluster.health.active_shards"
    );

    let parsed = parse_key_expr(&key).expect("Parse failed");
    assert_eq!(parsed.protocol, Protocol::Elasticsearch);
    assert_eq!(parsed.source, "es1");
    assert_eq!(parsed.metric, sample.path);

    let point = sample.into_point("es1", Protocol::Elasticsearch);
    for format in [Format::Json, Format::Cbor] {
        let bytes = encode(&point, format).expect("encode failed");
        let decoded: TelemetryPoint = decode(&bytes, format).expect("decode failed");
        assert_eq!(decoded.metric, "prod.cluster.health.active_shards");
        assert_eq!(decoded.value, 12.0);
    }
}

#[test]
fn test_router_metric_keys() {
    let builder = KeyExprBuilder::with_prefix("zensight/ddwrt");
    let key = builder.build("home-router", "AA:BB:CC:DD:EE:FF.SNR");
    assert_eq!(key, "zensight/ddwrt/home-router/AA:BB:CC:DD:EE:FF.SNR");
    assert_eq!(
        builder.source_wildcard("home-router"),
        "zensight/ddwrt/home-router/**"
    );
}
