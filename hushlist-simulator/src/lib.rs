/*!
# Hushlist Simulator

An in-process stand-in for the host notification platform, used to exercise the
filter deterministically.

## Key Components:
- **Simulated host:** visible notification tray, capability level, cancellation
  log, failure injection, access gate and app catalog.
- **Scenarios:** YAML step lists (post, block, unblock, expectations) that the
  engine replays against a simulated host.
*/

pub mod host;
pub mod scenario;

pub use host::SimulatedHost;
pub use scenario::{PostStep, Scenario, ScenarioError, Step};
