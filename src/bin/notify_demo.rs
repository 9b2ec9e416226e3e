//! Demo that pushes a synthetic diff through render + the sink mux
//! (stdout/log only when no sink env vars are set).

use tribeca_monitor::notify::render::render;
use tribeca_monitor::{Dao, DiffEvent, DiffKind, NotifierMux, Proposal, ProposalMeta};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();
    let mux = NotifierMux::from_env();

    let dao = Dao {
        address: "Govz6yWfh9Sv6zVqrGPKJMEKV95iHQtLpy2fWnQMUmpc".into(),
        name: "Demo DAO".into(),
        slug: "demo-dao".into(),
    };
    let event = DiffEvent {
        dao,
        kind: DiffKind::Threshold {
            previous: 5,
            current: 7,
        },
        new_proposals: vec![
            Proposal {
                index: 6,
                address: "Prop6".into(),
                meta: Some(ProposalMeta {
                    title: "Raise the quorum".into(),
                    description_link: String::new(),
                }),
            },
            Proposal {
                index: 7,
                address: "Prop7".into(),
                meta: None,
            },
        ],
    };

    if let Some(payload) = render(&event, 250) {
        mux.dispatch(&payload).await;
    }

    println!("notify-demo done");
}
