//! Accessors against a fake daemon.

use f2b_client::{ErrorKind, Fail2BanError, Fail2BanSocket, JailStats};
use f2b_test_utils::{init_test_tracing, replies, FakeDaemon, Reply};
use std::time::Duration;

#[tokio::test]
async fn test_ping() {
    init_test_tracing();
    let daemon = FakeDaemon::two_jails().await;
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();

    assert!(socket.ping().await.unwrap());
    assert_eq!(daemon.requests(), vec!["ping 100"]);
}

#[tokio::test]
async fn test_jails_and_stats() {
    let daemon = FakeDaemon::two_jails().await;
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();

    let jails = socket.jails().await.unwrap();
    assert_eq!(jails, vec!["sshd", "apache"]);

    let sshd = socket.jail("sshd").stats().await.unwrap();
    assert_eq!(
        sshd,
        JailStats {
            failed_current: 2,
            failed_total: 10,
            banned_current: 1,
            banned_total: 5,
        }
    );

    let apache = socket.jail("apache").stats().await.unwrap();
    assert!(apache.is_complete());
    assert_eq!(apache.banned_total, 0);
}

#[tokio::test]
async fn test_jail_options() {
    let daemon = FakeDaemon::two_jails().await;
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();

    let mut sshd = socket.jail("sshd");
    assert_eq!(sshd.ban_time().await.unwrap(), 600);
    assert_eq!(sshd.find_time().await.unwrap(), 600);
    assert_eq!(sshd.max_retries().await.unwrap(), 5);

    assert_eq!(
        daemon.requests(),
        vec!["get sshd bantime", "get sshd findtime", "get sshd maxretry"]
    );
}

#[tokio::test]
async fn test_version() {
    let daemon = FakeDaemon::two_jails().await;
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();
    assert_eq!(socket.version().await.unwrap(), "1.1.0");
}

#[tokio::test]
async fn test_banned_is_deduplicated() {
    let daemon = FakeDaemon::two_jails().await;
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();

    let banned = socket.banned().await.unwrap();
    assert_eq!(
        banned.into_iter().collect::<Vec<_>>(),
        vec!["192.0.2.1", "198.51.100.2"]
    );
}

#[tokio::test]
async fn test_several_commands_on_one_connection() {
    let daemon = FakeDaemon::two_jails().await;
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();

    for _ in 0..3 {
        assert!(socket.ping().await.unwrap());
    }
    assert_eq!(daemon.requests().len(), 3);
}

#[tokio::test]
async fn test_dial_failure_is_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Fail2BanSocket::connect(dir.path().join("missing.sock"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(err.command(), "connect");
}

#[tokio::test]
async fn test_hangup_is_connection_error() {
    let daemon = FakeDaemon::builder()
        .reply("status", Reply::Hangup)
        .spawn()
        .await;
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();

    let err = socket.jails().await.unwrap_err();
    assert!(err.is_connection());
    assert_eq!(err.command(), "status");
}

#[tokio::test]
async fn test_truncated_reply_is_decode_error() {
    let daemon = FakeDaemon::builder()
        .reply("version", Reply::Partial(b"\x80\x02K\x00X\x05\x00\x00\x001.".to_vec()))
        .spawn()
        .await;
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();

    let err = socket.version().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    match err {
        Fail2BanError::Decode { source, .. } => assert!(!source.consumed.is_empty()),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_reply_is_decode_error() {
    let daemon = FakeDaemon::builder()
        .reply("ping 100", Reply::Raw(b"\xffnot a pickle".to_vec()))
        .spawn()
        .await;
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();

    let err = socket.ping().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn test_wrong_shape_is_bad_format() {
    let daemon = FakeDaemon::builder()
        .reply("version", replies::int(11))
        .reply("status", replies::version("sshd"))
        .spawn()
        .await;
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();

    let err = socket.version().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);
    assert_eq!(
        err.to_string(),
        "(version) unexpected response format - $[1]: expected str, found int: (0, 11)"
    );

    let err = socket.jails().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);
}

#[tokio::test]
async fn test_unknown_jail_is_bad_format() {
    let daemon = FakeDaemon::two_jails().await;
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();

    let err = socket.jail("nginx").stats().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);
    assert_eq!(err.command(), "status nginx");
}

#[tokio::test]
async fn test_partial_stats_are_not_returned() {
    let daemon = FakeDaemon::builder()
        .reply(
            "status sshd",
            replies::ok(f2b_client::Value::List(vec![f2b_client::Value::Tuple(vec![
                "Filter".into(),
                f2b_client::Value::List(vec![]),
            ])])),
        )
        .spawn()
        .await;
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();

    let err = socket.jail("sshd").stats().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);
}

#[tokio::test]
async fn test_close_notifies_daemon() {
    let daemon = FakeDaemon::two_jails().await;
    let mut socket = Fail2BanSocket::connect(daemon.socket_path()).await.unwrap();
    assert!(socket.ping().await.unwrap());
    socket.close().await;

    for _ in 0..50 {
        if daemon.closes() == 1 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("daemon never saw the close frame");
}
