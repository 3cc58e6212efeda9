mod scenario_spec;
mod stop;
