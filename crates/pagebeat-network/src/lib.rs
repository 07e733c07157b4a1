//! # pagebeat-network
//!
//! HTTP 전송 어댑터.
//! `ReportSink` 포트의 reqwest 구현과, 전송 결과로부터 온라인 상태를
//! 추정하는 연결 추적기를 제공한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use pagebeat_network::http_sink::HttpReportSink;
//! use pagebeat_network::connectivity::ConnectivityTracker;
//!
//! let connectivity = Arc::new(ConnectivityTracker::default_threshold());
//! let sink = HttpReportSink::new("https://collect.example/v1/batch")?
//!     .with_connectivity(connectivity.clone());
//! ```

pub mod connectivity;
pub mod http_sink;
