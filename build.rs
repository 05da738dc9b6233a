use std::cmp::Ordering;
use std::env;
use std::process::Command;

// Backends the fetch/store primitive can be compiled for.
#[derive(PartialEq, Eq, Debug)]
struct Backend {
    name: &'static str,
    target_arch: &'static [&'static str],
    target_feature: &'static str,
    cpuinfo_names: &'static [&'static str],
    sysctl_key: &'static str,
    cfg_flag: &'static str,
    detected: bool,
}

impl Backend {
    // Lowest number == highest priority
    fn priority(&self) -> usize {
        match self.name {
            "sse2" => 0,
            "neon" => 1,
            _ => usize::MAX,
        }
    }

    fn backends() -> Vec<Backend> {
        vec![
            Backend {
                name: "sse2",
                target_arch: &["x86", "x86_64"],
                target_feature: "sse2",
                cpuinfo_names: &["sse2"],
                sysctl_key: "hw.optional.sse2: 1",
                cfg_flag: "sse",
                detected: false,
            },
            Backend {
                name: "neon",
                target_arch: &["aarch64"],
                target_feature: "neon",
                // Linux reports Advanced SIMD as `asimd` on aarch64
                cpuinfo_names: &["asimd", "neon"],
                sysctl_key: "hw.optional.neon: 1",
                cfg_flag: "neon",
                detected: false,
            },
        ]
    }

    fn matches_target(&self, arch: &str, features: &str) -> bool {
        self.target_arch.contains(&arch) && features.split(',').any(|f| f == self.target_feature)
    }
}

impl Ord for Backend {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl PartialOrd for Backend {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

trait CpuFeatureDetector {
    fn detect_features(&self, backends: &mut [Backend]);
    fn is_applicable(&self) -> bool;
}

struct LinuxDetector;
impl CpuFeatureDetector for LinuxDetector {
    fn detect_features(&self, backends: &mut [Backend]) {
        if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
            let flags: Vec<String> = cpuinfo
                .lines()
                .filter(|line| line.starts_with("flags") || line.starts_with("Features"))
                .flat_map(|line| line.split_whitespace().map(str::to_lowercase))
                .collect();

            for backend in backends.iter_mut() {
                backend.detected = backend
                    .cpuinfo_names
                    .iter()
                    .any(|name| flags.iter().any(|flag| flag == name));
            }
        }
    }

    fn is_applicable(&self) -> bool {
        cfg!(target_os = "linux")
    }
}

struct MacOSDetector;
impl CpuFeatureDetector for MacOSDetector {
    fn detect_features(&self, backends: &mut [Backend]) {
        let output = Command::new("sysctl").args(["-a"]).output();

        if let Ok(output) = output {
            let contents = String::from_utf8_lossy(&output.stdout).to_lowercase();

            for backend in backends.iter_mut() {
                backend.detected = contents.contains(backend.sysctl_key);
            }
        }
    }

    fn is_applicable(&self) -> bool {
        cfg!(target_os = "macos")
    }
}

struct PlatformDetector;
impl PlatformDetector {
    fn cpu_features_detectors() -> Vec<Box<dyn CpuFeatureDetector>> {
        vec![Box::new(LinuxDetector), Box::new(MacOSDetector)]
    }

    // Returns false when no detector applies to the build host.
    fn detect_cpu_features(backends: &mut [Backend]) -> bool {
        for detector in Self::cpu_features_detectors() {
            if detector.is_applicable() {
                detector.detect_features(backends);
                return true;
            }
        }
        false
    }

    fn apply(cfg_flag: &str) {
        println!("cargo:rustc-cfg={cfg_flag}");

        println!("cargo::rustc-check-cfg=cfg(sse)");
        println!("cargo::rustc-check-cfg=cfg(neon)");
        println!("cargo::rustc-check-cfg=cfg(fallback)");
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=MEMSTREAM_BACKEND");

    let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    let target_features = env::var("CARGO_CFG_TARGET_FEATURE").unwrap_or_default();

    let mut backends = Backend::backends();
    backends.sort();

    // A backend is only usable if the compilation target has its instructions
    backends.retain(|backend| backend.matches_target(&arch, &target_features));

    let host = env::var("HOST").unwrap_or_default();
    let target = env::var("TARGET").unwrap_or_default();

    // Only run CPU detection for native builds
    let detected = host == target && PlatformDetector::detect_cpu_features(&mut backends);
    if !detected {
        for backend in backends.iter_mut() {
            backend.detected = true;
        }
    }

    let selected = backends
        .iter()
        .find(|backend| backend.detected)
        .map(|backend| backend.cfg_flag)
        .unwrap_or("fallback");

    let cfg_flag = match env::var("MEMSTREAM_BACKEND") {
        Ok(requested) if requested == "fallback" => "fallback",
        Ok(requested) => match backends.iter().find(|b| b.cfg_flag == requested) {
            Some(backend) => backend.cfg_flag,
            None => {
                println!(
                    "cargo:warning=MEMSTREAM_BACKEND={requested} is not available for {arch}, using {selected}"
                );
                selected
            }
        },
        Err(_) => selected,
    };

    println!("applying: {cfg_flag}");

    PlatformDetector::apply(cfg_flag);
}
