//! Ordered provisioning of a site, each stage gated on the previous one.
use crate::{
    Component, Error, Report, Result, SiteConfig, SiteLayout, SiteManager,
    backup::SCRIPTS_MOUNT,
    gateway::{ApplyOutcome, ClusterGateway},
    manifests::{Manifest, SiteContext, application, database, ingress, scripts},
};
use std::{fs, os::unix::fs::DirBuilderExt, path::Path};

fn create_private_dir(path: &Path) -> std::io::Result<()> {
    fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

fn outcome(o: ApplyOutcome) -> &'static str {
    match o {
        ApplyOutcome::Changed => "applied",
        ApplyOutcome::Unchanged => "unchanged",
    }
}

impl<G: ClusterGateway> SiteManager<G> {
    /// Provision every resource of the site then run the first boot initialization.
    ///
    /// Fatal steps stop the sequence and mark the report aborted, other
    /// failures are recorded and the sequence goes on. Nothing is rolled back.
    pub async fn deploy(&self, config: &SiteConfig) -> Result<Report> {
        let site = self.layout.site(&config.site()?);
        let _lock = self.lock(site.site())?;
        let mut report = Report::new(&format!("deploy {}", site.site()));
        tracing::info!(site = %site.site(), version = %config.version, "deploying");

        if let Err(e) = create_private_dir(site.manifest_dir()) {
            report.abort(
                "manifest-directory",
                format!("cannot create {}: {e}", site.manifest_dir().display()),
            );
            return Ok(report);
        }
        report.ok("manifest-directory", site.manifest_dir().display().to_string());

        if !self.ensure_namespace(&site, &mut report).await {
            return Ok(report);
        }
        self.ensure_storage(&site, &mut report);
        self.ensure_registry_secret(&site, &mut report).await;

        let ctx = SiteContext {
            settings: &self.settings,
            layout: &site,
            config,
        };
        let db_manifest = site.database_manifest(&config.version);
        let app_manifest = site.application_manifest(&config.version);
        let ingress_manifest = site.ingress_manifest();
        write_manifest(&mut report, "database-manifest", database::render(&ctx), &db_manifest);
        write_manifest(&mut report, "ingress-manifest", ingress::render(&ctx), &ingress_manifest);
        write_manifest(&mut report, "application-manifest", application::render(&ctx), &app_manifest);

        self.apply(&site, &mut report, "database-apply", &db_manifest).await;
        if !self.await_component(&site, &mut report, Component::Database).await {
            return Ok(report);
        }

        self.apply(&site, &mut report, "application-apply", &app_manifest).await;
        self.apply(&site, &mut report, "ingress-apply", &ingress_manifest).await;
        let Some(pod) = self.await_component_pod(&site, &mut report, Component::Application).await else {
            return Ok(report);
        };

        self.run_init_scripts(&site, &pod, &mut report).await;
        tracing::info!("{report}");
        Ok(report)
    }

    /// Run the first boot scripts in the application pod of an already deployed site
    pub async fn initialize(&self, site: &str) -> Result<Report> {
        let site = self.site(site)?;
        let _lock = self.lock(site.site())?;
        let pod = self.find_pod(&site, Component::Application).await?;
        let mut report = Report::new(&format!("initialize {}", site.site()));
        self.run_init_scripts(&site, &pod, &mut report).await;
        Ok(report)
    }

    async fn ensure_namespace(&self, site: &SiteLayout, report: &mut Report) -> bool {
        let ns = site.namespace();
        let res = match self.gateway.namespace_exists(ns).await {
            Ok(true) => Ok("already exists"),
            Ok(false) => self.gateway.create_namespace(ns).await.map(|_| "created"),
            Err(e) => Err(e),
        };
        match res {
            Ok(msg) => {
                report.ok("namespace", format!("{ns} {msg}"));
                true
            }
            Err(e) => {
                report.abort("namespace", format!("cannot ensure namespace {ns}: {e}"));
                false
            }
        }
    }

    fn ensure_storage(&self, site: &SiteLayout, report: &mut Report) {
        let mut created = Vec::new();
        let mut errors = Vec::new();
        for dir in site.storage_dirs() {
            if dir.is_dir() {
                continue;
            }
            match fs::create_dir_all(&dir) {
                Ok(()) => created.push(dir.display().to_string()),
                Err(e) => errors.push(format!("{}: {e}", dir.display())),
            }
        }
        if !errors.is_empty() {
            report.failed("storage", format!("cannot create {}", errors.join(", ")));
        } else if created.is_empty() {
            report.ok("storage", "volume directories already exist");
        } else {
            report.ok("storage", format!("created {}", created.join(", ")));
        }
    }

    async fn ensure_registry_secret(&self, site: &SiteLayout, report: &mut Report) {
        let ns = site.namespace();
        let name = &self.settings.registry.secret_name;
        let res = match self.gateway.secret_exists(ns, name).await {
            Ok(true) => Ok("already exists"),
            Ok(false) => match self.settings.registry.secret(ns) {
                Ok(secret) => self.gateway.create_secret(ns, &secret).await.map(|_| "created"),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        match res {
            Ok(msg) => report.ok("registry-secret", format!("{name} {msg}")),
            Err(e) => report.failed("registry-secret", format!("cannot ensure secret {name}: {e}")),
        }
    }

    async fn apply(&self, site: &SiteLayout, report: &mut Report, step: &str, manifest: &Path) {
        match self.gateway.apply(manifest, site.namespace()).await {
            Ok(o) => report.ok(step, format!("{} {}", manifest.display(), outcome(o))),
            Err(e) => report.failed(step, format!("cannot apply {}: {e}", manifest.display())),
        }
    }

    /// Wait for the component pod to be ready, false when the deploy must stop
    async fn await_component(&self, site: &SiteLayout, report: &mut Report, component: Component) -> bool {
        self.await_component_pod(site, report, component).await.is_some()
    }

    async fn await_component_pod(
        &self,
        site: &SiteLayout,
        report: &mut Report,
        component: Component,
    ) -> Option<String> {
        let found = format!("{component}-pod");
        let ready = format!("{component}-ready");
        if let Err(e) = self.settle(&format!("{component} pod")).await {
            report.abort(&found, e.to_string());
            return None;
        }
        let pod = match self.find_pod(site, component).await {
            Ok(pod) => pod,
            Err(e) => {
                report.abort(&found, e.to_string());
                return None;
            }
        };
        report.ok(&found, pod.clone());
        match self.wait_ready(site, &pod).await {
            Ok(()) => {
                report.ok(&ready, format!("{pod} is ready"));
                Some(pod)
            }
            Err(e) => {
                report.abort(&ready, e.to_string());
                None
            }
        }
    }

    async fn run_init_scripts(&self, site: &SiteLayout, pod: &str, report: &mut Report) {
        for (step, script) in [("init-site", scripts::INIT_SITE), ("init-manager", scripts::INIT_MANAGER)] {
            let command = vec!["bash".to_string(), format!("{SCRIPTS_MOUNT}/{script}")];
            let res = self
                .gateway
                .exec(site.namespace(), pod, command.clone())
                .await
                .and_then(|out| {
                    if out.success() {
                        Ok(out)
                    } else {
                        Err(Error::CommandFailed(command.join(" "), out.status, out.stderr))
                    }
                });
            match res {
                Ok(out) => {
                    tracing::debug!("{script} output:\n{}", out.stdout);
                    report.ok(step, format!("{script} completed"));
                }
                Err(e) => report.failed(step, e.to_string()),
            }
        }
    }
}

fn write_manifest(report: &mut Report, step: &str, rendered: Result<Manifest>, path: &Path) {
    match rendered.and_then(|m| m.write(path)) {
        Ok(()) => report.ok(step, path.display().to_string()),
        Err(e) => report.failed(step, format!("cannot write {}: {e}", path.display())),
    }
}
