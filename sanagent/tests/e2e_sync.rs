//! End-to-end sync tests: a mock array management API on one side, a mock
//! CMDB on the other, and the full orchestrator in between.

use sanagent::run::{run_sync, RunConfig};

use cmdbstore::StoreConfig;
use serde_json::{json, Value};
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn run_config(cmdb: &MockServer, source: &MockServer) -> RunConfig {
    RunConfig {
        store: StoreConfig::new(cmdb.uri()),
        username: "admin".to_string(),
        password: "secret".to_string(),
        device_scheme: "http".to_string(),
        device_port: source.address().port(),
        target_ip: None,
        accept_invalid_certs: false,
    }
}

/// One array record in the CMDB, pointing at the mock source server.
fn array_record() -> Value {
    json!({
        "name": "arr",
        "MgmtIP": "127.0.0.1",
        "instanceId": "a-1",
        "_object_id": "DISK_ARRAY",
    })
}

async fn mount_cmdb_search(server: &MockServer, object_id: &str, list: Vec<Value>) {
    Mock::given(method("POST"))
        .and(path(format!("/object/{object_id}/instance/_search")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0, "data": {"list": list}
        })))
        .mount(server)
        .await;
}

/// Everything else on the CMDB side acks with an empty success envelope.
async fn mount_cmdb_catch_all(server: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0, "data": {"list": []}
        })))
        .mount(server)
        .await;
}

async fn mount_source_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/deviceManager/rest/xxxxx/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"deviceid": "dev-1", "iBaseToken": "t-1"}
        })))
        .mount(server)
        .await;
}

async fn mount_source_resource(server: &MockServer, resource: &str, data: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/deviceManager/rest/dev-1/{resource}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": data})))
        .mount(server)
        .await;
}

async fn mount_source_catch_all(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(server)
        .await;
}

async fn bodies(server: &MockServer, http_method: &str, url_path: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| {
            request.method.to_string() == http_method && request.url.path() == url_path
        })
        .map(|request| serde_json::from_slice(&request.body).unwrap_or(Value::Null))
        .collect()
}

/// Two hosts on the array, one host group containing host #1 only: the
/// group's relation must resolve to exactly host #1's sink instance id.
#[tokio::test]
async fn host_group_relation_resolves_single_member() {
    let cmdb = MockServer::start().await;
    let source = MockServer::start().await;

    mount_cmdb_search(&cmdb, "DISK_ARRAY", vec![array_record()]).await;
    mount_cmdb_search(
        &cmdb,
        "DISK_ARRAY_HOST",
        vec![
            json!({"name": "arr_h1", "instanceId": "h-1", "_object_id": "DISK_ARRAY_HOST"}),
            json!({"name": "arr_h2", "instanceId": "h-2", "_object_id": "DISK_ARRAY_HOST"}),
        ],
    )
    .await;
    mount_cmdb_search(
        &cmdb,
        "DISK_ARRAY_HOSTGROUP",
        vec![json!({"name": "arr_hg1_5", "instanceId": "g-1", "_object_id": "DISK_ARRAY_HOSTGROUP"})],
    )
    .await;
    mount_cmdb_catch_all(&cmdb).await;

    mount_source_login(&source).await;
    mount_source_resource(
        &source,
        "system/",
        json!({"NAME": "arr", "SECTORSIZE": "512", "PRODUCTMODE": "68", "TOTALCAPACITY": "4294967296"}),
    )
    .await;
    mount_source_resource(
        &source,
        "host",
        json!([
            {"NAME": "h1", "ID": "1", "IP": "10.0.0.1", "OPERATIONSYSTEM": "0"},
            {"NAME": "h2", "ID": "2", "IP": "10.0.0.2", "OPERATIONSYSTEM": "7"},
        ]),
    )
    .await;
    mount_source_resource(&source, "hostgroup", json!([{"NAME": "hg1", "ID": "5"}])).await;
    // The group's association answers host #1 only.
    Mock::given(method("GET"))
        .and(path("/deviceManager/rest/dev-1/host/associate"))
        .and(query_param("ASSOCIATEOBJID", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"NAME": "h1"}]
        })))
        .mount(&source)
        .await;
    mount_source_catch_all(&source).await;

    let summary = run_sync(&run_config(&cmdb, &source)).await.expect("run succeeds");
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed_logins, 0);
    assert_eq!(summary.stale_deleted, 0);

    // The host batch went up as one upsert keyed on name.
    let host_imports = bodies(&cmdb, "POST", "/object/DISK_ARRAY_HOST/instance/_import").await;
    assert_eq!(host_imports.len(), 1);
    assert_eq!(host_imports[0]["keys"], json!(["name"]));
    let datas = host_imports[0]["datas"].as_array().unwrap();
    assert_eq!(datas.len(), 2);
    assert_eq!(datas[0]["name"], "arr_h1");
    assert_eq!(datas[0]["operationsystem"], "Linux");
    assert_eq!(datas[1]["name"], "arr_h2");
    assert_eq!(datas[1]["operationsystem"], "VMware ESX");

    // Relation rewrite: exactly host #1's instance id, and hostNum == 1.
    let group_imports =
        bodies(&cmdb, "POST", "/object/DISK_ARRAY_HOSTGROUP/instance/_import").await;
    let relation = group_imports
        .iter()
        .find(|body| body["datas"][0].get("_HOSTGROUP_HOST").is_some())
        .expect("relation import issued");
    assert_eq!(relation["datas"][0]["name"], "arr_hg1_5");
    assert_eq!(relation["datas"][0]["_HOSTGROUP_HOST"], json!(["h-1"]));
    assert_eq!(relation["datas"][0]["hostNum"], 1);

    // Array record update carries the summary counters.
    let updates = bodies(&cmdb, "PUT", "/object/DISK_ARRAY/instance/a-1").await;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["HostGroup"], 2);
    assert_eq!(updates[0]["LunGroup"], 0);
    assert_eq!(updates[0]["Model"], "5500 V3");
    assert_eq!(updates[0]["Total"], "2.00T");

    // The array-to-host relation goes through the native append endpoint.
    let appends = bodies(&cmdb, "POST", "/object/DISK_ARRAY/relation/_ARRAY_HOST/append").await;
    assert_eq!(appends.len(), 1);
    assert_eq!(appends[0]["instance_ids"], json!(["a-1"]));
    assert_eq!(appends[0]["related_instance_ids"], json!(["h-1", "h-2"]));
}

/// An association that resolves nothing must not clear the relation field:
/// no relation import is issued for that group.
#[tokio::test]
async fn empty_association_skips_relation_update() {
    let cmdb = MockServer::start().await;
    let source = MockServer::start().await;

    mount_cmdb_search(&cmdb, "DISK_ARRAY", vec![array_record()]).await;
    mount_cmdb_catch_all(&cmdb).await;

    mount_source_login(&source).await;
    mount_source_resource(&source, "hostgroup", json!([{"NAME": "hg1", "ID": "5"}])).await;
    // No associate mock: the membership fetch answers empty.
    mount_source_catch_all(&source).await;

    let summary = run_sync(&run_config(&cmdb, &source)).await.expect("run succeeds");
    assert_eq!(summary.completed, 1);

    let group_imports =
        bodies(&cmdb, "POST", "/object/DISK_ARRAY_HOSTGROUP/instance/_import").await;
    // The collection batch still went up, but no relation rewrite happened.
    assert!(!group_imports.is_empty());
    assert!(group_imports
        .iter()
        .all(|body| body["datas"][0].get("_HOSTGROUP_HOST").is_none()));
}

/// A pre-run record whose name is not touched this run is deleted; touched
/// names survive.
#[tokio::test]
async fn stale_records_of_completed_arrays_are_swept() {
    let cmdb = MockServer::start().await;
    let source = MockServer::start().await;

    mount_cmdb_search(&cmdb, "DISK_ARRAY", vec![array_record()]).await;
    mount_cmdb_search(
        &cmdb,
        "LUN",
        vec![
            json!({"name": "arr_lun1", "instanceId": "l-1", "_object_id": "LUN"}),
            json!({"name": "arr_ghost", "instanceId": "l-9", "_object_id": "LUN"}),
        ],
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/object/LUN/instance/l-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
        .expect(1)
        .mount(&cmdb)
        .await;
    mount_cmdb_catch_all(&cmdb).await;

    mount_source_login(&source).await;
    mount_source_resource(&source, "lun", json!([{"NAME": "lun1", "ID": "11"}])).await;
    mount_source_catch_all(&source).await;

    let summary = run_sync(&run_config(&cmdb, &source)).await.expect("run succeeds");
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.stale_deleted, 1);

    let deletes: Vec<_> = cmdb
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.to_string() == "DELETE")
        .collect();
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].url.path(), "/object/LUN/instance/l-9");
}

/// Login failure skips the array without touching its sink records.
#[tokio::test]
async fn failed_login_leaves_sink_records_alone() {
    let cmdb = MockServer::start().await;
    let source = MockServer::start().await;

    mount_cmdb_search(&cmdb, "DISK_ARRAY", vec![array_record()]).await;
    mount_cmdb_search(
        &cmdb,
        "DISK_ARRAY_HOST",
        vec![json!({"name": "arr_h1", "instanceId": "h-1", "_object_id": "DISK_ARRAY_HOST"})],
    )
    .await;
    mount_cmdb_catch_all(&cmdb).await;

    Mock::given(method("POST"))
        .and(path("/deviceManager/rest/xxxxx/sessions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&source)
        .await;

    let summary = run_sync(&run_config(&cmdb, &source)).await.expect("run succeeds");
    assert_eq!(summary.completed, 0);
    assert_eq!(summary.failed_logins, 1);
    assert_eq!(summary.stale_deleted, 0);

    let deletes = cmdb
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.to_string() == "DELETE")
        .count();
    assert_eq!(deletes, 0);
}
