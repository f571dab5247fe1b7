//! Testcontainers-backed Neo4j harness for the live graph integration tests.

use testcontainers::{
    core::{ContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

use crate::GraphClient;

/// Start a throwaway Neo4j and return the container handle plus a connected
/// client. Keep the handle alive for the duration of the test; dropping it
/// stops the container.
pub async fn neo4j_container() -> (ContainerAsync<GenericImage>, GraphClient) {
    let image = GenericImage::new("neo4j", "5.26.0-community")
        .with_exposed_port(ContainerPort::Tcp(7687))
        .with_wait_for(WaitFor::message_on_stdout("Started."))
        .with_env_var("NEO4J_AUTH", "neo4j/test");

    let container = image.start().await.expect("neo4j container failed to start");
    let bolt = container
        .get_host_port_ipv4(7687)
        .await
        .expect("no mapped bolt port");

    let uri = format!("bolt://127.0.0.1:{bolt}");
    let client = GraphClient::connect(&uri, "neo4j", "test", "neo4j")
        .await
        .expect("bolt connect failed");

    (container, client)
}
