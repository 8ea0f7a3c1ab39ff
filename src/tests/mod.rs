mod test_run_simulation;
