use std::sync::Arc;

use graft_config::ContainerConfig;
use graft_di::{
    metadata::{arg, arg_value},
    Argument, ClassSpec, MetadataRegistry, ParamSpec, Reference,
};

struct Logger;

impl Logger {
    fn log(&self, message: &str) {
        println!("[log] {message}");
    }
}

struct Mailer {
    host: String,
    logger: Arc<Logger>,
}

impl Mailer {
    fn send(&self, recipient: &str) {
        self.logger
            .log(&format!("sending to {recipient} via {}", self.host));
    }
}

fn metadata() -> MetadataRegistry {
    let mut registry = MetadataRegistry::new();
    registry
        .register(ClassSpec::of::<Logger>("demo::Logger").with_constructor([], |_| Ok(Arc::new(Logger))))
        .unwrap();
    registry
        .register(ClassSpec::interface("demo::Transport"))
        .unwrap();
    registry
        .register(
            ClassSpec::of::<Mailer>("demo::Mailer")
                .implements("demo::Transport")
                .with_constructor(
                    [
                        ParamSpec::untyped("host"),
                        ParamSpec::typed("logger", "demo::Logger"),
                    ],
                    |values| {
                        Ok(Arc::new(Mailer {
                            host: arg_value::<String>(&values, 0)?,
                            logger: arg::<Logger>(&values, 1)?,
                        }))
                    },
                ),
        )
        .unwrap();
    registry
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = ContainerConfig::new();
    config
        .rule(
            "class:demo::Mailer",
            "host",
            Argument::value("smtp.example".to_string()),
        )
        .unwrap();
    config
        .point(
            Reference::new("demo::Transport"),
            Reference::new("demo::Mailer"),
        )
        .unwrap();

    let container = config.build_container(Arc::new(metadata())).unwrap();

    // resolving the interface reference lands on the pointed-to mailer,
    // with the logger pulled in through its type hint
    let mailer = container
        .get_as::<Mailer>(&Reference::new("demo::Transport"))
        .unwrap();
    mailer.send("team@example.org");

    println!("{container:?}");
}
